//! Error types for the link server.
//!
//! Errors are rendered as HTML pages rather than JSON, since visitors reach
//! these URLs from a browser or a link-preview crawler.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::render::components::{error_page, not_found_page};

/// Link server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// No live link exists for the path (missing or expired).
    #[error("link not found: {0}")]
    NotFound(String),

    /// The link store failed.
    #[error("store error: {0}")]
    Store(#[from] flowlinks_core::Error),
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let (status, markup) = match &self {
            Self::NotFound(path) => {
                tracing::debug!(path = %path, "link not found");
                (StatusCode::NOT_FOUND, not_found_page())
            }
            Self::Store(err) => {
                tracing::error!(error = %err, "link store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_page(
                        "Service Unavailable",
                        "Links are temporarily unavailable. Please try again later.",
                    ),
                )
            }
        };

        (
            status,
            [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))],
            markup,
        )
            .into_response()
    }
}
