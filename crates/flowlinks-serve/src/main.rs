//! Flowlinks Serve - HTTP server for deep-link redirect pages.
//!
//! Serves link preview pages with Open Graph tags and app-store redirects,
//! plus the iOS/Android app association files.

use axum::http::Request;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use flowlinks_serve::{AppState, Config, router};

/// Flowlinks Serve - deep-link redirect pages.
#[derive(Parser, Debug)]
#[command(name = "flowlinks-serve")]
#[command(about = "Deep-link redirect server", long_about = None)]
struct Args {
    /// Path to .env file (optional).
    #[arg(long, env = "DOTENV_PATH", default_value = ".env")]
    dotenv: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load .env file if it exists
    if std::path::Path::new(&args.dotenv).exists() {
        dotenvy::from_path(&args.dotenv)?;
        eprintln!("Loaded environment from {}", args.dotenv);
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    warn_on_missing_app_identity(&config);
    let bind_addr = config.bind_addr.clone();

    // Connect the link store and load the page template
    let state = AppState::from_config(config)?;

    // Build router with middleware
    let app = router(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any));

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "starting link server");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Association files built from empty ids are served but never verify.
fn warn_on_missing_app_identity(config: &Config) {
    let project = &config.project;
    if project.ios_team_id.is_empty() || project.ios_bundle_id.is_empty() {
        tracing::warn!("IOS_TEAM_ID or IOS_BUNDLE_ID not set, universal links will not verify");
    }
    if project.android_package.is_empty() || project.android_sha256.is_empty() {
        tracing::warn!("ANDROID_BUNDLE_ID or ANDROID_SHA not set, app links will not verify");
    }
}
