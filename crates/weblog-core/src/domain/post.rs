use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - the write model for a blog post.
///
/// `pub_date` may lie in the future; such posts stay hidden from
/// everyone but their author until the date elapses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub author_id: Uuid,
    pub category_id: Uuid,
    pub location_id: Option<Uuid>,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post owned by `author_id`.
    pub fn new(
        author_id: Uuid,
        title: String,
        text: String,
        category_id: Uuid,
        location_id: Option<Uuid>,
        pub_date: DateTime<Utc>,
        is_published: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            text,
            author_id,
            category_id,
            location_id,
            pub_date,
            is_published,
            created_at: Utc::now(),
        }
    }
}

/// Flat read model for feeds and the detail page: a post joined with its
/// author, category and location, annotated with the comment count.
///
/// `comment_count` is recomputed by the store on every query, never
/// persisted. The denormalized `category_is_published` flag is what the
/// visibility policy inspects, so views must always be built from
/// current rows rather than reused across requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub author_id: Uuid,
    pub author_username: String,
    pub category_id: Uuid,
    pub category_title: String,
    pub category_slug: String,
    pub category_is_published: bool,
    pub location_name: Option<String>,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}
