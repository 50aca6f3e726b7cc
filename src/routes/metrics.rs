//! Prometheus metrics endpoint
//!
//! Exposes application metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    // Force initialization of the lazy static
    let _ = &*PROMETHEUS_HANDLE;

    register_metrics();
}

/// Register all custom metrics
fn register_metrics() {
    metrics::describe_counter!(
        "nutrio_cache_operations_total",
        "Cache operations by cache name and result"
    );
    metrics::describe_counter!(
        "nutrio_rate_limit_checks_total",
        "Rate limit checks by limiter name and outcome"
    );
    metrics::describe_counter!(
        "nutrio_generation_outcomes_total",
        "Plan generation outcomes by model"
    );
}

/// Prometheus metrics endpoint handler
///
/// Returns metrics in Prometheus text format for scraping.
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record a cache operation (hit, miss, expired, evict)
pub fn record_cache_operation(cache: &'static str, result: &'static str) {
    metrics::counter!(
        "nutrio_cache_operations_total",
        "cache" => cache,
        "result" => result
    )
    .increment(1);
}

/// Record a rate limit check
pub fn record_rate_limit(limiter: &'static str, allowed: bool) {
    let outcome = if allowed { "allowed" } else { "rejected" };
    metrics::counter!(
        "nutrio_rate_limit_checks_total",
        "limiter" => limiter,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a generation outcome (success, exhausted, failed)
pub fn record_generation(model: &str, outcome: &'static str) {
    metrics::counter!(
        "nutrio_generation_outcomes_total",
        "model" => model.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
