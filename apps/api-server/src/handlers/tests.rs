//! Handler tests over an in-memory repository set.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use uuid::Uuid;

use weblog_core::domain::{Category, Comment, CommentView, Location, Post, PostView, User};
use weblog_core::error::RepoError;
use weblog_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PasswordService,
    PostRepository, TokenService, UserRepository,
};
use weblog_core::query::{Audience, PageRequest, PostFilter};
use weblog_infra::auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
use weblog_shared::Paginated;
use weblog_shared::dto::{PostResponse, ProfileFeedResponse};

use crate::state::AppState;

#[derive(Default)]
struct Db {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    locations: HashMap<Uuid, Location>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
}

/// Every repository port backed by one shared in-memory table set.
struct MemRepos {
    inner: Mutex<Db>,
}

impl MemRepos {
    fn new(db: Db) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(db),
        })
    }
}

fn view(db: &Db, post: &Post) -> PostView {
    let author = &db.users[&post.author_id];
    let category = &db.categories[&post.category_id];
    let location = post.location_id.and_then(|id| db.locations.get(&id));
    let comment_count = db
        .comments
        .values()
        .filter(|c| c.post_id == post.id)
        .count() as i64;

    PostView {
        id: post.id,
        title: post.title.clone(),
        text: post.text.clone(),
        author_id: post.author_id,
        author_username: author.username.clone(),
        category_id: category.id,
        category_title: category.title.clone(),
        category_slug: category.slug.clone(),
        category_is_published: category.is_published,
        location_name: location.map(|l| l.name.clone()),
        pub_date: post.pub_date,
        is_published: post.is_published,
        comment_count,
        created_at: post.created_at,
    }
}

fn matches(db: &Db, post: &Post, filter: &PostFilter) -> bool {
    if let Audience::Public { now } = filter.audience {
        let category_published = db
            .categories
            .get(&post.category_id)
            .is_some_and(|c| c.is_published);
        if !(post.is_published && category_published && post.pub_date <= now) {
            return false;
        }
    }
    if let Some(category_id) = filter.category_id {
        if post.category_id != category_id {
            return false;
        }
    }
    if let Some(author_id) = filter.author_id {
        if post.author_id != author_id {
            return false;
        }
    }
    true
}

macro_rules! mem_base_repository {
    ($domain:ty, $table:ident) => {
        #[async_trait]
        impl BaseRepository<$domain, Uuid> for MemRepos {
            async fn find_by_id(&self, id: Uuid) -> Result<Option<$domain>, RepoError> {
                Ok(self.inner.lock().unwrap().$table.get(&id).cloned())
            }

            async fn save(&self, entity: $domain) -> Result<$domain, RepoError> {
                self.inner
                    .lock()
                    .unwrap()
                    .$table
                    .insert(entity.id, entity.clone());
                Ok(entity)
            }

            async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
                self.inner
                    .lock()
                    .unwrap()
                    .$table
                    .remove(&id)
                    .map(|_| ())
                    .ok_or(RepoError::NotFound)
            }
        }
    };
}

mem_base_repository!(User, users);
mem_base_repository!(Category, categories);
mem_base_repository!(Location, locations);
mem_base_repository!(Post, posts);
mem_base_repository!(Comment, comments);

#[async_trait]
impl UserRepository for MemRepos {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}

#[async_trait]
impl CategoryRepository for MemRepos {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .categories
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }
}

#[async_trait]
impl LocationRepository for MemRepos {}

#[async_trait]
impl PostRepository for MemRepos {
    async fn find_view_by_id(&self, id: Uuid) -> Result<Option<PostView>, RepoError> {
        let db = self.inner.lock().unwrap();
        Ok(db.posts.get(&id).map(|post| view(&db, post)))
    }

    async fn list(
        &self,
        filter: &PostFilter,
        page: &PageRequest,
    ) -> Result<Vec<PostView>, RepoError> {
        let db = self.inner.lock().unwrap();
        let mut posts: Vec<&Post> = db
            .posts
            .values()
            .filter(|post| matches(&db, post, filter))
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));

        Ok(posts
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .map(|post| view(&db, post))
            .collect())
    }

    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        let db = self.inner.lock().unwrap();
        Ok(db
            .posts
            .values()
            .filter(|post| matches(&db, post, filter))
            .count() as u64)
    }
}

#[async_trait]
impl CommentRepository for MemRepos {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, RepoError> {
        let db = self.inner.lock().unwrap();
        let mut comments: Vec<&Comment> = db
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by_key(|c| c.created_at);

        Ok(comments
            .into_iter()
            .map(|c| CommentView {
                id: c.id,
                post_id: c.post_id,
                author_id: c.author_id,
                author_username: db.users[&c.author_id].username.clone(),
                text: c.text.clone(),
                created_at: c.created_at,
            })
            .collect())
    }
}

fn state_from(db: Db) -> AppState {
    let repos = MemRepos::new(db);
    AppState {
        users: repos.clone(),
        categories: repos.clone(),
        locations: repos.clone(),
        posts: repos.clone(),
        comments: repos,
    }
}

fn token_service() -> Arc<dyn TokenService> {
    Arc::new(JwtTokenService::new(JwtConfig {
        secret: "test-secret".to_string(),
        expiration_hours: 1,
        issuer: "test".to_string(),
    }))
}

fn bearer(tokens: &Arc<dyn TokenService>, user: &User) -> (header::HeaderName, String) {
    let token = tokens
        .generate_token(user.id, &user.username, user.is_superuser)
        .unwrap();
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

fn seed_user(db: &mut Db, username: &str) -> User {
    let user = User::new(
        username.to_string(),
        format!("{username}@example.com"),
        "hash".to_string(),
    );
    db.users.insert(user.id, user.clone());
    user
}

fn seed_category(db: &mut Db, slug: &str, is_published: bool) -> Category {
    let mut category = Category::new(
        slug.to_string(),
        "A category".to_string(),
        slug.to_string(),
    );
    category.is_published = is_published;
    db.categories.insert(category.id, category.clone());
    category
}

fn seed_post(db: &mut Db, author: &User, category: &Category, is_published: bool) -> Post {
    let post = Post::new(
        author.id,
        "A post".to_string(),
        "Some text".to_string(),
        category.id,
        None,
        Utc::now() - TimeDelta::days(1),
        is_published,
    );
    db.posts.insert(post.id, post.clone());
    post
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .app_data(web::Data::new(token_service()))
                .app_data(web::Data::new(
                    Arc::new(Argon2PasswordService::new()) as Arc<dyn PasswordService>
                ))
                .configure(super::configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn unpublished_category_feed_is_not_found() {
    let mut db = Db::default();
    let author = seed_user(&mut db, "alice");
    let category = seed_category(&mut db, "hidden", false);
    seed_post(&mut db, &author, &category, true);

    let app = test_app!(state_from(db));

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/categories/hidden")
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn draft_detail_is_hidden_from_strangers_but_not_its_author() {
    let mut db = Db::default();
    let author = seed_user(&mut db, "alice");
    let category = seed_category(&mut db, "travel", true);
    let draft = seed_post(&mut db, &author, &category, false);

    let app = test_app!(state_from(db));
    let tokens = token_service();
    let uri = format!("/api/posts/{}", draft.id);

    // Anonymous viewer: indistinguishable from a missing post.
    let resp =
        test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // The author still reads their own draft.
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&uri)
            .insert_header(bearer(&tokens, &author))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn comment_delete_by_non_author_redirects_and_keeps_comment() {
    let mut db = Db::default();
    let author = seed_user(&mut db, "alice");
    let stranger = seed_user(&mut db, "bob");
    let category = seed_category(&mut db, "travel", true);
    let post = seed_post(&mut db, &author, &category, true);
    let comment = Comment::new(post.id, author.id, "first!".to_string());
    db.comments.insert(comment.id, comment.clone());

    let state = state_from(db);
    let app = test_app!(state.clone());
    let tokens = token_service();

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/posts/{}/comments/{}", post.id, comment.id))
            .insert_header(bearer(&tokens, &stranger))
            .to_request(),
    )
    .await;

    // Silent redirect to the parent post, not an error.
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert_eq!(location, format!("/api/posts/{}", post.id));

    // The comment is untouched.
    let kept = state.comments.find_by_id(comment.id).await.unwrap();
    assert!(kept.is_some());
}

#[actix_web::test]
async fn superuser_may_delete_someone_elses_comment() {
    let mut db = Db::default();
    let author = seed_user(&mut db, "alice");
    let mut admin = seed_user(&mut db, "root");
    admin.is_superuser = true;
    db.users.insert(admin.id, admin.clone());
    let category = seed_category(&mut db, "travel", true);
    let post = seed_post(&mut db, &author, &category, true);
    let comment = Comment::new(post.id, author.id, "first!".to_string());
    db.comments.insert(comment.id, comment.clone());

    let state = state_from(db);
    let app = test_app!(state.clone());
    let tokens = token_service();

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/posts/{}/comments/{}", post.id, comment.id))
            .insert_header(bearer(&tokens, &admin))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(
        state
            .comments
            .find_by_id(comment.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[actix_web::test]
async fn profile_feed_shows_drafts_only_to_the_owner() {
    let mut db = Db::default();
    let author = seed_user(&mut db, "alice");
    let category = seed_category(&mut db, "travel", true);
    seed_post(&mut db, &author, &category, true);
    seed_post(&mut db, &author, &category, false);

    let app = test_app!(state_from(db));
    let tokens = token_service();

    let anonymous: ProfileFeedResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/profiles/alice")
            .to_request(),
    )
    .await;
    assert_eq!(anonymous.posts.total_items, 1);

    let owned: ProfileFeedResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/profiles/alice")
            .insert_header(bearer(&tokens, &author))
            .to_request(),
    )
    .await;
    assert_eq!(owned.posts.total_items, 2);
}

#[actix_web::test]
async fn feed_orders_newest_pub_date_first() {
    let mut db = Db::default();
    let author = seed_user(&mut db, "alice");
    let category = seed_category(&mut db, "travel", true);
    let older = seed_post(&mut db, &author, &category, true);
    let mut newer = seed_post(&mut db, &author, &category, true);
    newer.pub_date = Utc::now() - TimeDelta::hours(1);
    db.posts.insert(newer.id, newer.clone());

    let app = test_app!(state_from(db));

    let page: Paginated<PostResponse> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/posts").to_request(),
    )
    .await;

    assert_eq!(page.total_items, 2);
    assert_eq!(page.items[0].id, newer.id);
    assert_eq!(page.items[1].id, older.id);
}
