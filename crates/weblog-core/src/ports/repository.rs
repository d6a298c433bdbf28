use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Category, Comment, CommentView, Location, Post, PostView, User};
use crate::error::RepoError;
use crate::query::{PageRequest, PostFilter};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with identity lookups.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Category repository.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;
}

/// Location repository. Lookups beyond the base CRUD are not needed;
/// locations are only referenced from posts.
#[async_trait]
pub trait LocationRepository: BaseRepository<Location, Uuid> {}

/// Post repository: CRUD on the write model plus the annotated read
/// side the feeds are built from.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// A single post joined with author/category/location and annotated
    /// with its current comment count. Returns the row regardless of
    /// visibility; callers apply the visibility policy themselves.
    async fn find_view_by_id(&self, id: Uuid) -> Result<Option<PostView>, RepoError>;

    /// One page of the filtered feed, newest pub_date first.
    async fn list(
        &self,
        filter: &PostFilter,
        page: &PageRequest,
    ) -> Result<Vec<PostView>, RepoError>;

    /// Total number of posts matching the filter, for page arithmetic.
    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// All comments under a post, oldest first, with author usernames.
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, RepoError>;
}
