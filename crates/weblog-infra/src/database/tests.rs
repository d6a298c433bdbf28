use chrono::TimeDelta;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

use weblog_core::domain::{Comment, Post, User};
use weblog_core::error::RepoError;
use weblog_core::ports::{BaseRepository, UserRepository};

use crate::database::entity::{post, user};
use crate::database::postgres_repo::{
    PostgresCommentRepository, PostgresPostRepository, PostgresUserRepository,
};

fn post_model(author_id: Uuid) -> post::Model {
    let now = chrono::Utc::now();
    post::Model {
        id: Uuid::new_v4(),
        title: "First post".to_owned(),
        text: "Hello".to_owned(),
        author_id,
        category_id: Uuid::new_v4(),
        location_id: None,
        pub_date: (now - TimeDelta::days(1)).into(),
        is_published: true,
        created_at: now.into(),
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let author_id = Uuid::new_v4();
    let model = post_model(author_id);
    let post_id = model.id;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![model]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    assert!(result.is_some());
    let post = result.unwrap();
    assert_eq!(post.id, post_id);
    assert_eq!(post.author_id, author_id);
    assert_eq!(post.title, "First post");
}

#[tokio::test]
async fn test_find_user_by_username() {
    let now = chrono::Utc::now();
    let model = user::Model {
        id: Uuid::new_v4(),
        username: "alice".to_owned(),
        email: "alice@example.com".to_owned(),
        password_hash: "hash".to_owned(),
        first_name: None,
        last_name: None,
        is_superuser: false,
        created_at: now.into(),
    };
    let user_id = model.id;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![model]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);

    let result: Option<User> = repo.find_by_username("alice").await.unwrap();

    assert!(result.is_some());
    let user = result.unwrap();
    assert_eq!(user.id, user_id);
    assert_eq!(user.username, "alice");
    assert!(!user.is_superuser);
}

#[tokio::test]
async fn test_delete_missing_comment_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresCommentRepository::new(db);

    let result: Result<(), RepoError> =
        BaseRepository::<Comment, Uuid>::delete(&repo, Uuid::new_v4()).await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_save_inserts_new_post_after_update_misses() {
    let model = post_model(Uuid::new_v4());
    let domain: Post = model.clone().into();

    // First query (UPDATE .. RETURNING) matches nothing, second
    // (INSERT .. RETURNING) yields the stored row.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<post::Model>::new(), vec![model]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let saved: Post = repo.save(domain).await.unwrap();
    assert_eq!(saved.title, "First post");
}
