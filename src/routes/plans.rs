//! AI plan generation endpoints
//!
//! Both endpoints sit behind the auth middleware and the AI rate
//! limiter. Generated plans are cached per user and request fingerprint,
//! so re-submitting identical parameters within the TTL serves the
//! cached plan instead of a fresh model call.

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::Serialize;
use tracing::info;

use crate::{
    ai::plans::{MealPlanDay, MealPlanRequest, WorkoutDay, WorkoutPlanRequest},
    cache::keys,
    error::{AppError, AppResult},
    middleware::auth::AuthenticatedUser,
    AppState,
};

/// Longest plan clients may request
const MAX_PLAN_DAYS: u8 = 14;

/// Generated meal plan response
#[derive(Debug, Serialize)]
pub struct MealPlanResponse {
    pub plan: Vec<MealPlanDay>,
}

/// Generated workout plan response
#[derive(Debug, Serialize)]
pub struct WorkoutPlanResponse {
    pub plan: Vec<WorkoutDay>,
}

fn validate_days(days: u8) -> AppResult<()> {
    if days == 0 || days > MAX_PLAN_DAYS {
        return Err(AppError::BadRequest(format!(
            "days must be between 1 and {}",
            MAX_PLAN_DAYS
        )));
    }
    Ok(())
}

/// POST /api/plans/meal
pub async fn generate_meal_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<MealPlanRequest>,
) -> AppResult<Json<MealPlanResponse>> {
    validate_days(request.days)?;

    let cache_key = keys::meal_plan(&user.user_id, &keys::fingerprint(&request));
    let ttl = state.caches.ai.default_ttl();

    let plan = state
        .caches
        .ai
        .get_or_compute(&cache_key, ttl, || async {
            // The profile only shapes the prompt; a missing profile is fine.
            let profile = state.store.get_profile(&user.user_id).await?;
            info!(user_id = %user.user_id, days = request.days, "Generating meal plan");
            state
                .generator
                .generate_meal_plan(&request, profile.as_ref())
                .await
        })
        .await?;

    Ok(Json(MealPlanResponse { plan }))
}

/// POST /api/plans/workout
pub async fn generate_workout_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<WorkoutPlanRequest>,
) -> AppResult<Json<WorkoutPlanResponse>> {
    validate_days(request.days)?;

    let cache_key = keys::workout_plan(&user.user_id, &keys::fingerprint(&request));
    let ttl = state.caches.ai.default_ttl();

    let plan = state
        .caches
        .ai
        .get_or_compute(&cache_key, ttl, || async {
            info!(user_id = %user.user_id, days = request.days, "Generating workout plan");
            state.generator.generate_workout_plan(&request).await
        })
        .await?;

    Ok(Json(WorkoutPlanResponse { plan }))
}
