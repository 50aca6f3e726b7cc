//! HTTP routes for nutrio
//!
//! This module defines all HTTP endpoints exposed by the service.

pub mod foods;
pub mod health;
pub mod meals;
pub mod metrics;
pub mod plans;
pub mod profile;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    middleware::{auth::auth_middleware, rate_limiter::rate_limit_layer},
    AppState,
};

/// Overall request deadline; generous enough for a full retry+fallback pass
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Each guarded group gets its own limiter; within one request the
    // order is always auth, then rate limit, then the cached handler.
    let ai_routes = Router::new()
        .route("/api/plans/meal", post(plans::generate_meal_plan))
        .route("/api/plans/workout", post(plans::generate_workout_plan))
        .layer(middleware::from_fn(rate_limit_layer(
            state.limiters.ai.clone(),
        )));

    let food_routes = Router::new()
        .route("/api/foods/search", get(foods::search_foods))
        .layer(middleware::from_fn(rate_limit_layer(
            state.limiters.food_search.clone(),
        )));

    let general_routes = Router::new()
        .route("/api/meals", get(meals::list_meals).post(meals::log_meal))
        .route("/api/meals/summary", get(meals::daily_summary))
        .route(
            "/api/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .layer(middleware::from_fn(rate_limit_layer(
            state.limiters.general.clone(),
        )));

    // Middleware is applied in reverse order, so auth runs before the
    // per-group rate limiters above.
    let protected_routes = Router::new()
        .merge(ai_routes)
        .merge(food_routes)
        .merge(general_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Public routes (health check, metrics) - no auth required
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Global middleware (applied to all routes)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
