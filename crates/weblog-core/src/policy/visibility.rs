//! Post visibility policy.

use chrono::{DateTime, Utc};

use crate::domain::{Actor, PostView};

/// Decide whether `viewer` may read `post` at instant `now`.
///
/// Authors always see their own posts, drafts and future-dated ones
/// included. Everyone else sees a post only while it is published, its
/// category is published and its pub_date has elapsed.
///
/// Callers guarding a detail fetch must surface a failed check as "not
/// found", never "forbidden", so unpublished posts do not leak their
/// existence.
pub fn is_visible(viewer: Option<&Actor>, post: &PostView, now: DateTime<Utc>) -> bool {
    if viewer.is_some_and(|v| v.id == post.author_id) {
        return true;
    }
    post.is_published && post.category_is_published && post.pub_date <= now
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use uuid::Uuid;

    use super::*;

    fn actor(id: Uuid) -> Actor {
        Actor {
            id,
            is_superuser: false,
        }
    }

    fn view(author_id: Uuid, is_published: bool, category_published: bool) -> PostView {
        let now = Utc::now();
        PostView {
            id: Uuid::new_v4(),
            title: "title".into(),
            text: "text".into(),
            author_id,
            author_username: "author".into(),
            category_id: Uuid::new_v4(),
            category_title: "Travel".into(),
            category_slug: "travel".into(),
            category_is_published: category_published,
            location_name: None,
            pub_date: now - TimeDelta::days(1),
            is_published,
            comment_count: 0,
            created_at: now,
        }
    }

    #[test]
    fn published_post_is_visible_to_anonymous() {
        let post = view(Uuid::new_v4(), true, true);
        assert!(is_visible(None, &post, Utc::now()));
    }

    #[test]
    fn unpublished_post_is_visible_only_to_author() {
        let author_id = Uuid::new_v4();
        let post = view(author_id, false, true);
        let now = Utc::now();

        assert!(is_visible(Some(&actor(author_id)), &post, now));
        assert!(!is_visible(Some(&actor(Uuid::new_v4())), &post, now));
        assert!(!is_visible(None, &post, now));
    }

    #[test]
    fn future_pub_date_hides_post_regardless_of_flags() {
        let author_id = Uuid::new_v4();
        let mut post = view(author_id, true, true);
        let now = Utc::now();
        post.pub_date = now + TimeDelta::days(2);

        assert!(!is_visible(None, &post, now));
        assert!(!is_visible(Some(&actor(Uuid::new_v4())), &post, now));
        // The author still sees their scheduled post.
        assert!(is_visible(Some(&actor(author_id)), &post, now));
    }

    #[test]
    fn pub_date_exactly_now_is_visible() {
        let mut post = view(Uuid::new_v4(), true, true);
        let now = Utc::now();
        post.pub_date = now;
        assert!(is_visible(None, &post, now));
    }

    #[test]
    fn unpublished_category_hides_post_from_non_authors() {
        let author_id = Uuid::new_v4();
        let post = view(author_id, true, false);
        let now = Utc::now();

        assert!(!is_visible(None, &post, now));
        assert!(!is_visible(Some(&actor(Uuid::new_v4())), &post, now));
        assert!(is_visible(Some(&actor(author_id)), &post, now));
    }

    #[test]
    fn superuser_flag_grants_no_read_shortcut() {
        // Visibility is about authorship, not privilege: a superuser who
        // is not the author sees exactly what anonymous sees.
        let post = view(Uuid::new_v4(), false, true);
        let admin = Actor {
            id: Uuid::new_v4(),
            is_superuser: true,
        };
        assert!(!is_visible(Some(&admin), &post, Utc::now()));
    }
}
