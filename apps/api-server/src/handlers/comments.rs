//! Comment handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use weblog_core::domain::{Comment, CommentView};
use weblog_core::policy::{MutationTarget, can_mutate};
use weblog_shared::dto::{CommentRequest, CommentResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub(super) fn comment_view_response(view: CommentView) -> CommentResponse {
    CommentResponse {
        id: view.id,
        post_id: view.post_id,
        author: view.author_username,
        text: view.text,
        created_at: view.created_at,
    }
}

fn comment_response(comment: Comment, author: String) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        author,
        text: comment.text,
        created_at: comment.created_at,
    }
}

/// Resolve a comment under a specific post, or 404.
async fn find_comment(state: &AppState, post_id: Uuid, comment_id: Uuid) -> AppResult<Comment> {
    state
        .comments
        .find_by_id(comment_id)
        .await?
        .filter(|comment| comment.post_id == post_id)
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
}

/// POST /api/posts/{post_id}/comments - reply to a post.
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let req = body.into_inner();

    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Text must not be empty".to_string()));
    }

    // The post must exist; its visibility is not re-checked here.
    state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let comment = Comment::new(post_id, identity.user_id, req.text);
    let saved = state.comments.save(comment).await?;

    Ok(HttpResponse::Created().json(comment_response(saved, identity.username)))
}

/// PUT /api/posts/{post_id}/comments/{comment_id} - edit a comment.
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = find_comment(&state, post_id, comment_id).await?;

    if !can_mutate(Some(&identity.actor()), MutationTarget::Comment(&comment)) {
        return Err(AppError::redirect_to_post(post_id));
    }

    let req = body.into_inner();
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Text must not be empty".to_string()));
    }

    let updated = Comment {
        text: req.text,
        ..comment
    };
    let saved = state.comments.save(updated).await?;

    Ok(HttpResponse::Ok().json(comment_response(saved, identity.username)))
}

/// DELETE /api/posts/{post_id}/comments/{comment_id} - remove a comment.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = find_comment(&state, post_id, comment_id).await?;

    if !can_mutate(Some(&identity.actor()), MutationTarget::Comment(&comment)) {
        return Err(AppError::redirect_to_post(post_id));
    }

    state.comments.delete(comment_id).await?;

    Ok(HttpResponse::NoContent().finish())
}
