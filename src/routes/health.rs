//! Health check endpoint
//!
//! Reports process liveness plus size/capacity stats for every named
//! cache. No outbound dependency probes happen here; upstream health is
//! the upstreams' business.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::cache::CacheStats;
use crate::AppState;

/// Stats for all named caches
#[derive(Debug, Serialize)]
pub struct CachesStats {
    pub ai: CacheStats,
    pub food: CacheStats,
    pub user: CacheStats,
    pub general: CacheStats,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub caches: CachesStats,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        caches: CachesStats {
            ai: state.caches.ai.stats(),
            food: state.caches.food.stats(),
            user: state.caches.user.stats(),
            general: state.caches.general.stats(),
        },
    })
}
