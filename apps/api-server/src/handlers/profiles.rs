//! Author profile handler.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use weblog_core::query::PostFilter;
use weblog_shared::dto::{ProfileFeedResponse, ProfileResponse};

use crate::handlers::posts::{PageQuery, paginate_posts};
use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/profiles/{username} - a user's page with their posts.
///
/// The owner sees every post they wrote, drafts and scheduled ones
/// included; any other viewer gets the publicly visible subset.
pub async fn feed(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();

    let profile = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    let actor = viewer.actor();
    let posts = paginate_posts(
        &state,
        PostFilter::profile_feed(profile.id, actor.as_ref(), Utc::now()),
        query.request(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(ProfileFeedResponse {
        profile: ProfileResponse {
            username: profile.username,
            first_name: profile.first_name,
            last_name: profile.last_name,
        },
        posts,
    }))
}
