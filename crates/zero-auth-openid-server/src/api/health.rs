use axum::{extract::State, response::Json};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
pub struct NonceStatsResponse {
    pub count: usize,
    pub capacity: usize,
    /// Resolved provider endpoint, `None` until discovery succeeds
    pub endpoint: Option<String>,
}

/// Replay cache diagnostics
pub async fn nonce_stats(State(state): State<Arc<AppState>>) -> Json<NonceStatsResponse> {
    Json(NonceStatsResponse {
        count: state.openid.nonce_count(),
        capacity: state.openid.nonce_capacity(),
        endpoint: state.openid.endpoint().await.map(|url| url.to_string()),
    })
}
