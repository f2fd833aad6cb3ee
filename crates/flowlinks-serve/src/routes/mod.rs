//! Route definitions for the link server.
//!
//! ## Routes
//!
//! - `GET /` - Default link, or a landing page when none is stored
//! - `GET /health` - Health check (JSON)
//! - `GET /robots.txt` - Crawler instructions
//! - `GET /.well-known/apple-app-site-association` - iOS universal links
//! - `GET /.well-known/assetlinks.json` - Android app links
//! - `GET /{*path}` - Link page

mod health;
mod home;
mod link;
mod well_known;

use axum::Router;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::state::AppState;

/// Build the complete link server router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(link::root_handler))
        .route("/health", get(health::health_check))
        .route("/robots.txt", get(robots_txt))
        .route(
            "/.well-known/apple-app-site-association",
            get(well_known::apple_app_site_association),
        )
        .route(
            "/.well-known/assetlinks.json",
            get(well_known::asset_links),
        )
        .route("/{*path}", get(link::link_handler))
        .with_state(state)
}

/// Serve robots.txt allowing all crawlers.
///
/// Link-preview crawlers must be able to fetch link pages.
async fn robots_txt() -> impl IntoResponse {
    (
        [("content-type", "text/plain; charset=utf-8")],
        "User-agent: *\nAllow: /\n",
    )
}
