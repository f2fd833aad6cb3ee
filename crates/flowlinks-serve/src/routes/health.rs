//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    store: &'static str,
}

/// Public health check endpoint for load balancer probes.
///
/// Does not touch the store; a failing store shows up as 500s on link pages.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "flowlinks-serve",
        version: env!("CARGO_PKG_VERSION"),
        store: state.store.backend(),
    })
}
