//! Feed query description.
//!
//! Feeds are described declaratively: a `PostFilter` names the audience
//! and the optional category/author constraints, and the store turns it
//! into one SQL statement. Results are always ordered by pub_date
//! descending and annotated with the per-post comment count.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::Actor;

/// Feeds are paginated in fixed pages of this many posts.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Which posts the requesting viewer is entitled to see in a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Anonymous baseline: post published, category published, pub_date
    /// elapsed at `now`.
    Public { now: DateTime<Utc> },
    /// The profile owner browsing their own posts: no visibility
    /// clauses, drafts and scheduled posts included.
    Owner,
}

/// Declarative filter for one feed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostFilter {
    pub audience: Audience,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
}

impl PostFilter {
    /// The front-page feed: everything visible to an anonymous viewer.
    pub fn feed(now: DateTime<Utc>) -> Self {
        Self {
            audience: Audience::Public { now },
            category_id: None,
            author_id: None,
        }
    }

    /// The feed of a single category. The category itself must already
    /// have been resolved as published; an unpublished category is "not
    /// found" before any posts are fetched.
    pub fn category_feed(category_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            audience: Audience::Public { now },
            category_id: Some(category_id),
            author_id: None,
        }
    }

    /// The feed of one author's posts. The owner sees all of them;
    /// everyone else sees only the publicly visible subset.
    pub fn profile_feed(author_id: Uuid, viewer: Option<&Actor>, now: DateTime<Utc>) -> Self {
        let audience = if viewer.is_some_and(|v| v.id == author_id) {
            Audience::Owner
        } else {
            Audience::Public { now }
        };
        Self {
            audience,
            category_id: None,
            author_id: Some(author_id),
        }
    }
}

/// A 1-based page request with a fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }

    /// Number of pages needed for `total` items; at least one, so an
    /// empty feed still renders page 1.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.per_page).max(1)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_feed_owner_bypasses_visibility() {
        let author_id = Uuid::new_v4();
        let owner = Actor {
            id: author_id,
            is_superuser: false,
        };
        let filter = PostFilter::profile_feed(author_id, Some(&owner), Utc::now());

        assert_eq!(filter.audience, Audience::Owner);
        assert_eq!(filter.author_id, Some(author_id));
    }

    #[test]
    fn profile_feed_for_stranger_applies_public_filter() {
        let now = Utc::now();
        let stranger = Actor {
            id: Uuid::new_v4(),
            is_superuser: false,
        };
        let filter = PostFilter::profile_feed(Uuid::new_v4(), Some(&stranger), now);

        assert_eq!(filter.audience, Audience::Public { now });
    }

    #[test]
    fn profile_feed_for_anonymous_applies_public_filter() {
        let now = Utc::now();
        let filter = PostFilter::profile_feed(Uuid::new_v4(), None, now);
        assert_eq!(filter.audience, Audience::Public { now });
    }

    #[test]
    fn superuser_is_not_a_profile_owner() {
        // Privilege grants mutation rights, not feed visibility.
        let now = Utc::now();
        let admin = Actor {
            id: Uuid::new_v4(),
            is_superuser: true,
        };
        let filter = PostFilter::profile_feed(Uuid::new_v4(), Some(&admin), now);
        assert_eq!(filter.audience, Audience::Public { now });
    }

    #[test]
    fn page_request_clamps_to_first_page() {
        assert_eq!(PageRequest::new(0).page, 1);
        assert_eq!(PageRequest::new(0).offset(), 0);
        assert_eq!(PageRequest::new(3).offset(), 20);
    }

    #[test]
    fn total_pages_rounds_up_and_never_hits_zero() {
        let page = PageRequest::default();
        assert_eq!(page.total_pages(0), 1);
        assert_eq!(page.total_pages(10), 1);
        assert_eq!(page.total_pages(11), 2);
    }
}
