//! Mutation authorization policy.

use uuid::Uuid;

use crate::domain::{Actor, Comment, Post};

/// The resource an update/delete request is aimed at.
///
/// Dispatch is an explicit enum rather than a trait object: posts and
/// comments are the only mutable resources and both expose an owning
/// author.
#[derive(Debug, Clone, Copy)]
pub enum MutationTarget<'a> {
    Post(&'a Post),
    Comment(&'a Comment),
}

impl MutationTarget<'_> {
    pub fn author_id(&self) -> Uuid {
        match self {
            Self::Post(post) => post.author_id,
            Self::Comment(comment) => comment.author_id,
        }
    }

    /// The post whose detail route a denied request is redirected to.
    pub fn parent_post_id(&self) -> Uuid {
        match self {
            Self::Post(post) => post.id,
            Self::Comment(comment) => comment.post_id,
        }
    }
}

/// Decide whether `actor` may update or delete `target`.
///
/// Only the resource's author or a superuser may mutate it; anonymous
/// actors never pass. A failed check is not an error surface: the
/// handler answers with a redirect to the parent post's detail route
/// instead of performing the mutation.
pub fn can_mutate(actor: Option<&Actor>, target: MutationTarget<'_>) -> bool {
    match actor {
        Some(actor) => actor.id == target.author_id() || actor.is_superuser,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(author_id: Uuid) -> Post {
        Post::new(
            author_id,
            "title".into(),
            "text".into(),
            Uuid::new_v4(),
            None,
            chrono::Utc::now(),
            true,
        )
    }

    fn comment(author_id: Uuid) -> Comment {
        Comment::new(Uuid::new_v4(), author_id, "text".into())
    }

    #[test]
    fn author_may_mutate_own_post() {
        let author_id = Uuid::new_v4();
        let post = post(author_id);
        let actor = Actor {
            id: author_id,
            is_superuser: false,
        };
        assert!(can_mutate(Some(&actor), MutationTarget::Post(&post)));
    }

    #[test]
    fn non_author_may_not_mutate() {
        let post = post(Uuid::new_v4());
        let stranger = Actor {
            id: Uuid::new_v4(),
            is_superuser: false,
        };
        assert!(!can_mutate(Some(&stranger), MutationTarget::Post(&post)));
    }

    #[test]
    fn superuser_may_mutate_anything() {
        let admin = Actor {
            id: Uuid::new_v4(),
            is_superuser: true,
        };
        let post = post(Uuid::new_v4());
        let comment = comment(Uuid::new_v4());

        assert!(can_mutate(Some(&admin), MutationTarget::Post(&post)));
        assert!(can_mutate(Some(&admin), MutationTarget::Comment(&comment)));
    }

    #[test]
    fn anonymous_never_passes() {
        let post = post(Uuid::new_v4());
        let comment = comment(Uuid::new_v4());

        assert!(!can_mutate(None, MutationTarget::Post(&post)));
        assert!(!can_mutate(None, MutationTarget::Comment(&comment)));
    }

    #[test]
    fn comment_author_may_mutate_own_comment_only() {
        let author_id = Uuid::new_v4();
        let own = comment(author_id);
        let other = comment(Uuid::new_v4());
        let actor = Actor {
            id: author_id,
            is_superuser: false,
        };

        assert!(can_mutate(Some(&actor), MutationTarget::Comment(&own)));
        assert!(!can_mutate(Some(&actor), MutationTarget::Comment(&other)));
    }

    #[test]
    fn denied_comment_mutation_redirects_to_parent_post() {
        let post_id = Uuid::new_v4();
        let comment = Comment::new(post_id, Uuid::new_v4(), "text".into());
        assert_eq!(
            MutationTarget::Comment(&comment).parent_post_id(),
            post_id
        );
    }
}
