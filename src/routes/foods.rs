//! Food search endpoint
//!
//! Sits behind the auth middleware and the food-search rate limiter.
//! Results are cached by normalized query so identical searches from
//! any user share one upstream call per TTL window.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    cache::keys,
    error::{AppError, AppResult},
    foods::{sanitize_query, FoodItem},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Food search response
#[derive(Debug, Serialize)]
pub struct FoodSearchResponse {
    pub query: String,
    pub foods: Vec<FoodItem>,
}

/// GET /api/foods/search?q=...
pub async fn search_foods(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<FoodSearchResponse>> {
    let query = sanitize_query(&params.q);
    if query.is_empty() {
        return Err(AppError::BadRequest("query parameter q is required".to_string()));
    }

    let cache_key = keys::food_search(&query);
    let ttl = state.caches.food.default_ttl();

    let foods = state
        .caches
        .food
        .get_or_compute(&cache_key, ttl, || async {
            state.food_client.search(&query).await
        })
        .await?;

    Ok(Json(FoodSearchResponse { query, foods }))
}
