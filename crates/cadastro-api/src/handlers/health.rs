//! Health check handler

use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use cadastro_core::CacheStatsReport;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub total_requests: u64,
    /// Session invalidation strategy in use
    pub session_strategy: String,
    /// Client listing cache statistics
    pub cache: CacheStatsReport,
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_secs(),
        total_requests: state.get_request_count(),
        session_strategy: state.auth.session_strategy().to_string(),
        cache: state.client_cache.stats().report(),
    })
}
