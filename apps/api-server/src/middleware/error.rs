//! Error handling - RFC 7807 responses plus the silent-redirect policy
//! for denied mutations.

use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};
use std::fmt;
use uuid::Uuid;
use weblog_shared::ErrorResponse;

/// Application-level error type.
///
/// `MutationDenied` is not an error surface in the usual sense: a
/// failed author check answers 303 See Other pointing at the parent
/// post's detail route, with no body and no mutation performed.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    Conflict(String),
    Internal(String),
    MutationDenied { post_id: Uuid },
}

impl AppError {
    /// Route a denied mutation back to the post it belongs to.
    pub fn redirect_to_post(post_id: Uuid) -> Self {
        Self::MutationDenied { post_id }
    }
}

/// Path of a post's detail route, used as the redirect target.
pub fn post_detail_path(post_id: Uuid) -> String {
    format!("/api/posts/{post_id}")
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::MutationDenied { post_id } => {
                write!(f, "Mutation denied, redirecting to post {}", post_id)
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::MutationDenied { .. } => StatusCode::SEE_OTHER,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Unauthorized => ErrorResponse::unauthorized(),
            AppError::Conflict(detail) => ErrorResponse::conflict(detail),
            AppError::Internal(detail) => {
                // Log internal errors
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
            AppError::MutationDenied { post_id } => {
                return HttpResponse::SeeOther()
                    .insert_header((header::LOCATION, post_detail_path(*post_id)))
                    .finish();
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

// Conversion from domain errors
impl From<weblog_core::error::DomainError> for AppError {
    fn from(err: weblog_core::error::DomainError) -> Self {
        match err {
            weblog_core::error::DomainError::NotFound { entity } => {
                AppError::NotFound(format!("{} not found", entity))
            }
            weblog_core::error::DomainError::Validation(msg) => AppError::BadRequest(msg),
            weblog_core::error::DomainError::Duplicate(msg) => AppError::Conflict(msg),
            weblog_core::error::DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<weblog_core::error::RepoError> for AppError {
    fn from(err: weblog_core::error::RepoError) -> Self {
        match err {
            weblog_core::error::RepoError::NotFound => {
                AppError::NotFound("Resource not found".to_string())
            }
            weblog_core::error::RepoError::Constraint(msg) => AppError::Conflict(msg),
            weblog_core::error::RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            weblog_core::error::RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denied_mutation_renders_303_to_post_detail() {
        let post_id = Uuid::new_v4();
        let response = AppError::redirect_to_post(post_id).error_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        assert_eq!(location, format!("/api/posts/{post_id}"));
    }

    #[test]
    fn not_found_renders_404() {
        let response = AppError::NotFound("Post not found".into()).error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
