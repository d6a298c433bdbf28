//! Category feed handler.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use weblog_core::query::PostFilter;
use weblog_shared::dto::{CategoryFeedResponse, CategoryResponse};

use crate::handlers::posts::{PageQuery, paginate_posts};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/categories/{slug} - posts of one published category.
///
/// An unpublished category is a 404 for everyone, regardless of what it
/// contains.
pub async fn feed(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();

    let category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .filter(|category| category.is_published)
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let posts = paginate_posts(
        &state,
        PostFilter::category_feed(category.id, Utc::now()),
        query.request(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(CategoryFeedResponse {
        category: CategoryResponse {
            title: category.title,
            slug: category.slug,
            description: category.description,
        },
        posts,
    }))
}
