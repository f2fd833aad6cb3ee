//! App association files.
//!
//! iOS fetches `apple-app-site-association` and Android fetches
//! `assetlinks.json` to verify that this domain may open the app directly.
//! Both are generated from the configured app identity.

use axum::Json;
use axum::extract::State;
use flowlinks_core::ProjectConfig;
use serde_json::{Value, json};

use crate::state::AppState;

/// `GET /.well-known/apple-app-site-association`
pub async fn apple_app_site_association(State(state): State<AppState>) -> Json<Value> {
    Json(apple_association(&state.config.project))
}

/// `GET /.well-known/assetlinks.json`
pub async fn asset_links(State(state): State<AppState>) -> Json<Value> {
    Json(android_asset_links(&state.config.project))
}

/// Universal links for every path, plus shared web credentials.
fn apple_association(project: &ProjectConfig) -> Value {
    let app_id = project.ios_app_id();
    json!({
        "applinks": {
            "apps": [],
            "details": [{
                "appID": app_id,
                "paths": ["*"],
            }],
        },
        "webcredentials": {
            "apps": [app_id],
        },
    })
}

/// One statement delegating URL handling to the Android app.
fn android_asset_links(project: &ProjectConfig) -> Value {
    json!([{
        "relation": ["delegate_permission/common.handle_all_urls"],
        "target": {
            "namespace": "android_app",
            "package_name": project.android_package,
            "sha256_cert_fingerprints": project.android_sha256,
        },
    }])
}
