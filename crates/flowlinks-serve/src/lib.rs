//! Flowlinks Serve - deep-link redirect pages.
//!
//! Resolves short paths to stored link records and answers with an HTML page
//! carrying Open Graph / Twitter card metadata, optionally redirecting the
//! visitor to the platform's app store or a fallback URL. It also serves the
//! association files iOS and Android fetch to verify universal/app links.
//!
//! # Architecture
//!
//! - **Resolve**: Normalizes the path, looks it up through a short-lived moka
//!   cache in front of the [`LinkStore`](flowlinks_core::LinkStore), drops
//!   expired links and picks the redirect target for the visitor's platform
//! - **Render**: Substitutes link values into the page template; 404 and
//!   error pages are rendered with maud
//!
//! # URL Pattern
//!
//! ```text
//! GET /{path}
//! ```
//!
//! # Security
//!
//! - Every substituted value is HTML-escaped
//! - Redirect and image URLs must be http(s)
//! - X-Frame-Options: DENY prevents clickjacking

pub mod config;
pub mod error;
pub mod render;
pub mod resolve;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::router;
pub use state::AppState;
