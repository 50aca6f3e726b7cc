//! Meal logging endpoints
//!
//! Thin CRUD over the meal store. Logging a meal invalidates the user's
//! cached daily summary so the next summary read recomputes from the
//! store instead of serving stale totals.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    cache::keys,
    error::{AppError, AppResult},
    middleware::auth::AuthenticatedUser,
    storage::{MealEntry, NewMealEntry},
    AppState,
};

/// Daily nutrition totals
#[derive(Debug, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub meal_count: usize,
    pub total_calories: u32,
    pub total_protein_g: f32,
    pub total_carbs_g: f32,
    pub total_fat_g: f32,
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    /// Defaults to today (UTC) when omitted
    pub date: Option<NaiveDate>,
}

/// Meal list response
#[derive(Debug, Serialize)]
pub struct MealListResponse {
    pub meals: Vec<MealEntry>,
}

/// GET /api/meals
pub async fn list_meals(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<MealListResponse>> {
    let meals = state.store.list_meals(&user.user_id).await?;
    Ok(Json(MealListResponse { meals }))
}

/// POST /api/meals
pub async fn log_meal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(entry): Json<NewMealEntry>,
) -> AppResult<(StatusCode, Json<MealEntry>)> {
    if entry.name.trim().is_empty() {
        return Err(AppError::BadRequest("meal name is required".to_string()));
    }

    let meal = state.store.insert_meal(&user.user_id, entry).await?;

    // The cached summary for that day is now stale; drop it.
    let date = meal.logged_at.date_naive().to_string();
    let invalidated = state
        .caches
        .user
        .delete(&keys::daily_summary(&user.user_id, &date));
    debug!(user_id = %user.user_id, %date, invalidated, "Logged meal");

    Ok((StatusCode::CREATED, Json(meal)))
}

/// GET /api/meals/summary?date=YYYY-MM-DD
pub async fn daily_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<SummaryParams>,
) -> AppResult<Json<DailySummary>> {
    let date = params.date.unwrap_or_else(|| Utc::now().date_naive());

    let cache_key = keys::daily_summary(&user.user_id, &date.to_string());
    let ttl = state.caches.user.default_ttl();

    let summary = state
        .caches
        .user
        .get_or_compute(&cache_key, ttl, || async {
            let meals = state.store.meals_for_day(&user.user_id, date).await?;
            Ok(summarize(date, &meals))
        })
        .await?;

    Ok(Json(summary))
}

fn summarize(date: NaiveDate, meals: &[MealEntry]) -> DailySummary {
    DailySummary {
        date,
        meal_count: meals.len(),
        total_calories: meals.iter().map(|m| m.calories).sum(),
        total_protein_g: meals.iter().map(|m| m.protein_g).sum(),
        total_carbs_g: meals.iter().map(|m| m.carbs_g).sum(),
        total_fat_g: meals.iter().map(|m| m.fat_g).sum(),
    }
}
