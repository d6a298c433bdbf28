//! PostgreSQL repository implementations.
//!
//! The feed queries translate a `PostFilter` into a single select:
//! posts joined with author/category/location, LEFT JOIN on comments
//! with a COUNT aggregate, ordered by pub_date descending.

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select, prelude::DateTimeWithTimeZone,
};
use uuid::Uuid;

use weblog_core::domain::{Category, CommentView, PostView, User};
use weblog_core::error::RepoError;
use weblog_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};
use weblog_core::query::{Audience, PageRequest, PostFilter};

use super::entity::{category, comment, location, post, user};
use super::postgres_base::PostgresBaseRepository;

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<user::Entity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<category::Entity>;

/// PostgreSQL location repository.
pub type PostgresLocationRepository = PostgresBaseRepository<location::Entity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<post::Entity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<comment::Entity>;

/// Row shape produced by the annotated post select.
#[derive(Debug, FromQueryResult)]
struct PostViewRow {
    id: Uuid,
    title: String,
    text: String,
    author_id: Uuid,
    author_username: String,
    category_id: Uuid,
    category_title: String,
    category_slug: String,
    category_is_published: bool,
    location_name: Option<String>,
    pub_date: DateTimeWithTimeZone,
    is_published: bool,
    comment_count: i64,
    created_at: DateTimeWithTimeZone,
}

impl From<PostViewRow> for PostView {
    fn from(row: PostViewRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            text: row.text,
            author_id: row.author_id,
            author_username: row.author_username,
            category_id: row.category_id,
            category_title: row.category_title,
            category_slug: row.category_slug,
            category_is_published: row.category_is_published,
            location_name: row.location_name,
            pub_date: row.pub_date.into(),
            is_published: row.is_published,
            comment_count: row.comment_count,
            created_at: row.created_at.into(),
        }
    }
}

/// Base select for `PostView` rows. Grouping is by the primary keys of
/// every joined table; the other selected columns are functionally
/// dependent on them.
fn post_view_select() -> Select<post::Entity> {
    post::Entity::find()
        .select_only()
        .columns([
            post::Column::Id,
            post::Column::Title,
            post::Column::Text,
            post::Column::AuthorId,
            post::Column::CategoryId,
            post::Column::PubDate,
            post::Column::IsPublished,
            post::Column::CreatedAt,
        ])
        .column_as(user::Column::Username, "author_username")
        .column_as(category::Column::Title, "category_title")
        .column_as(category::Column::Slug, "category_slug")
        .column_as(category::Column::IsPublished, "category_is_published")
        .column_as(location::Column::Name, "location_name")
        .column_as(comment::Column::Id.count(), "comment_count")
        .join(JoinType::InnerJoin, post::Relation::Author.def())
        .join(JoinType::InnerJoin, post::Relation::Category.def())
        .join(JoinType::LeftJoin, post::Relation::Location.def())
        .join(JoinType::LeftJoin, post::Relation::Comment.def())
        .group_by(post::Column::Id)
        .group_by(user::Column::Id)
        .group_by(category::Column::Id)
        .group_by(location::Column::Id)
}

/// Apply a `PostFilter` to a post select that already joins categories.
fn apply_filter(mut select: Select<post::Entity>, filter: &PostFilter) -> Select<post::Entity> {
    if let Audience::Public { now } = filter.audience {
        select = select
            .filter(post::Column::IsPublished.eq(true))
            .filter(category::Column::IsPublished.eq(true))
            .filter(post::Column::PubDate.lte(now));
    }
    if let Some(category_id) = filter.category_id {
        select = select.filter(post::Column::CategoryId.eq(category_id));
    }
    if let Some(author_id) = filter.author_id {
        select = select.filter(post::Column::AuthorId.eq(author_id));
    }
    select
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        // Mask email for logging to avoid PII in logs
        let masked = if let Some(at_pos) = email.find('@') {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = if local.len() > 1 {
                format!("{}***", &local[..1])
            } else {
                "***".to_string()
            };
            format!("{}{}", masked_local, domain)
        } else {
            "***".to_string()
        };
        tracing::debug!(user_email = %masked, "Finding user by email");

        let result = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_view_by_id(&self, id: Uuid) -> Result<Option<PostView>, RepoError> {
        let row = post_view_select()
            .filter(post::Column::Id.eq(id))
            .into_model::<PostViewRow>()
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    async fn list(
        &self,
        filter: &PostFilter,
        page: &PageRequest,
    ) -> Result<Vec<PostView>, RepoError> {
        let rows = apply_filter(post_view_select(), filter)
            .order_by(post::Column::PubDate, Order::Desc)
            .offset(page.offset())
            .limit(page.per_page)
            .into_model::<PostViewRow>()
            .all(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        // No aggregate select here, only the category join the
        // visibility clauses filter on.
        let select = apply_filter(
            post::Entity::find().join(JoinType::InnerJoin, post::Relation::Category.def()),
            filter,
        );

        select
            .count(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))
    }
}

/// Row shape for comments joined with their author.
#[derive(Debug, FromQueryResult)]
struct CommentViewRow {
    id: Uuid,
    post_id: Uuid,
    author_id: Uuid,
    author_username: String,
    text: String,
    created_at: DateTimeWithTimeZone,
}

impl From<CommentViewRow> for CommentView {
    fn from(row: CommentViewRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            author_username: row.author_username,
            text: row.text,
            created_at: row.created_at.into(),
        }
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, RepoError> {
        let rows = comment::Entity::find()
            .select_only()
            .columns([
                comment::Column::Id,
                comment::Column::PostId,
                comment::Column::AuthorId,
                comment::Column::Text,
                comment::Column::CreatedAt,
            ])
            .column_as(user::Column::Username, "author_username")
            .join(JoinType::InnerJoin, comment::Relation::Author.def())
            .filter(comment::Column::PostId.eq(post_id))
            .order_by(comment::Column::CreatedAt, Order::Asc)
            .into_model::<CommentViewRow>()
            .all(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sea_orm::{DbBackend, QueryTrait};
    use weblog_core::domain::Actor;

    use super::*;

    #[test]
    fn public_feed_sql_filters_and_orders() {
        let stmt = apply_filter(post_view_select(), &PostFilter::feed(Utc::now()))
            .order_by(post::Column::PubDate, Order::Desc)
            .build(DbBackend::Postgres)
            .to_string();

        assert!(stmt.contains(r#""posts"."is_published" = TRUE"#));
        assert!(stmt.contains(r#""categories"."is_published" = TRUE"#));
        assert!(stmt.contains(r#""posts"."pub_date" <="#));
        assert!(stmt.contains(r#"ORDER BY "posts"."pub_date" DESC"#));
        assert!(stmt.contains(r#"COUNT("comments"."id") AS "comment_count""#));
        assert!(stmt.contains("LEFT JOIN"));
        assert!(stmt.contains("GROUP BY"));
    }

    #[test]
    fn category_feed_sql_adds_category_clause() {
        let category_id = Uuid::new_v4();
        let stmt = apply_filter(
            post_view_select(),
            &PostFilter::category_feed(category_id, Utc::now()),
        )
        .build(DbBackend::Postgres)
        .to_string();

        assert!(stmt.contains(r#""posts"."category_id" ="#));
        assert!(stmt.contains(r#""posts"."is_published" = TRUE"#));
    }

    #[test]
    fn owner_profile_feed_sql_skips_visibility_clauses() {
        let author_id = Uuid::new_v4();
        let owner = Actor {
            id: author_id,
            is_superuser: false,
        };
        let stmt = apply_filter(
            post_view_select(),
            &PostFilter::profile_feed(author_id, Some(&owner), Utc::now()),
        )
        .build(DbBackend::Postgres)
        .to_string();

        assert!(stmt.contains(r#""posts"."author_id" ="#));
        assert!(!stmt.contains(r#""posts"."is_published" = TRUE"#));
        assert!(!stmt.contains(r#""posts"."pub_date" <="#));
    }

    #[test]
    fn stranger_profile_feed_sql_keeps_visibility_clauses() {
        let stmt = apply_filter(
            post_view_select(),
            &PostFilter::profile_feed(Uuid::new_v4(), None, Utc::now()),
        )
        .build(DbBackend::Postgres)
        .to_string();

        assert!(stmt.contains(r#""posts"."author_id" ="#));
        assert!(stmt.contains(r#""posts"."is_published" = TRUE"#));
        assert!(stmt.contains(r#""categories"."is_published" = TRUE"#));
    }
}
