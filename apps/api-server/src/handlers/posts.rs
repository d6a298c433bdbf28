//! Post handlers: the public feed, detail view and author CRUD.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use weblog_core::domain::{Post, PostView};
use weblog_core::policy::{MutationTarget, can_mutate, is_visible};
use weblog_core::query::{PageRequest, PostFilter};
use weblog_shared::Paginated;
use weblog_shared::dto::{CreatePostRequest, PostDetailResponse, PostResponse, UpdatePostRequest};

use crate::handlers::comments::comment_view_response;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// `?page=N` query string, 1-based.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<u64>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1))
    }
}

pub(super) fn post_response(view: PostView) -> PostResponse {
    PostResponse {
        id: view.id,
        title: view.title,
        text: view.text,
        author: view.author_username,
        category_title: view.category_title,
        category_slug: view.category_slug,
        location: view.location_name,
        pub_date: view.pub_date,
        is_published: view.is_published,
        comment_count: view.comment_count,
        created_at: view.created_at,
    }
}

/// Fetch one page of a feed plus the page arithmetic for its envelope.
pub(super) async fn paginate_posts(
    state: &AppState,
    filter: PostFilter,
    page: PageRequest,
) -> AppResult<Paginated<PostResponse>> {
    let total = state.posts.count(&filter).await?;
    let views = state.posts.list(&filter, &page).await?;

    Ok(Paginated::new(
        views.into_iter().map(post_response).collect(),
        page.page,
        page.per_page,
        total,
        page.total_pages(total),
    ))
}

/// Check that the referenced category (and location, when given) exist.
async fn validate_references(
    state: &AppState,
    category_id: Uuid,
    location_id: Option<Uuid>,
) -> AppResult<()> {
    if state.categories.find_by_id(category_id).await?.is_none() {
        return Err(AppError::BadRequest("Unknown category".to_string()));
    }
    if let Some(location_id) = location_id {
        if state.locations.find_by_id(location_id).await?.is_none() {
            return Err(AppError::BadRequest("Unknown location".to_string()));
        }
    }
    Ok(())
}

/// GET /api/posts - the public feed.
pub async fn feed(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let posts = paginate_posts(&state, PostFilter::feed(Utc::now()), query.request()).await?;

    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/{post_id} - detail view, guarded by visibility.
///
/// A post the viewer may not see answers 404, exactly like a missing
/// one, so drafts and scheduled posts do not leak.
pub async fn detail(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    let view = state
        .posts
        .find_view_by_id(post_id)
        .await?
        .filter(|view| is_visible(viewer.actor().as_ref(), view, Utc::now()))
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let comments = state.comments.find_by_post(post_id).await?;

    Ok(HttpResponse::Ok().json(PostDetailResponse {
        post: post_response(view),
        comments: comments.into_iter().map(comment_view_response).collect(),
    }))
}

/// POST /api/posts - create a post owned by the caller.
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title must not be empty".to_string()));
    }
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Text must not be empty".to_string()));
    }
    validate_references(&state, req.category_id, req.location_id).await?;

    let post = Post::new(
        identity.user_id,
        req.title,
        req.text,
        req.category_id,
        req.location_id,
        req.pub_date.unwrap_or_else(Utc::now),
        req.is_published,
    );
    let saved = state.posts.save(post).await?;

    let view = state
        .posts
        .find_view_by_id(saved.id)
        .await?
        .ok_or_else(|| AppError::Internal("Post missing after save".to_string()))?;

    Ok(HttpResponse::Created().json(post_response(view)))
}

/// PUT /api/posts/{post_id} - full update by the author or a superuser.
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    if !can_mutate(Some(&identity.actor()), MutationTarget::Post(&post)) {
        return Err(AppError::redirect_to_post(post_id));
    }

    let req = body.into_inner();
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title must not be empty".to_string()));
    }
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Text must not be empty".to_string()));
    }
    validate_references(&state, req.category_id, req.location_id).await?;

    let updated = Post {
        title: req.title,
        text: req.text,
        category_id: req.category_id,
        location_id: req.location_id,
        pub_date: req.pub_date.unwrap_or(post.pub_date),
        is_published: req.is_published,
        ..post
    };
    state.posts.save(updated).await?;

    let view = state
        .posts
        .find_view_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::Internal("Post missing after save".to_string()))?;

    Ok(HttpResponse::Ok().json(post_response(view)))
}

/// DELETE /api/posts/{post_id} - delete by the author or a superuser.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    if !can_mutate(Some(&identity.actor()), MutationTarget::Post(&post)) {
        return Err(AppError::redirect_to_post(post_id));
    }

    state.posts.delete(post_id).await?;

    Ok(HttpResponse::NoContent().finish())
}
