//! Static pages.

use actix_web::HttpResponse;
use serde::Serialize;

#[derive(Serialize)]
struct StaticPage {
    slug: &'static str,
    title: &'static str,
    body: &'static str,
}

/// GET /api/pages/about
pub async fn about() -> HttpResponse {
    HttpResponse::Ok().json(StaticPage {
        slug: "about",
        title: "About this blog",
        body: "A small community blog about places worth writing about. \
               Posts are grouped by category and tagged with a location.",
    })
}

/// GET /api/pages/rules
pub async fn rules() -> HttpResponse {
    HttpResponse::Ok().json(StaticPage {
        slug: "rules",
        title: "House rules",
        body: "Be kind. Stay on topic. Authors own their posts and \
               comments; moderators may remove anything that breaks \
               these rules.",
    })
}
