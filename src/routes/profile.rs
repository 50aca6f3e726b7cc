//! Profile endpoints
//!
//! Reads go through the user cache; updates write through the store and
//! then delete the cached entry so the next read sees fresh data.

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use tracing::debug;

use crate::{
    cache::keys,
    error::{AppError, AppResult},
    middleware::auth::AuthenticatedUser,
    storage::Profile,
    AppState,
};

/// Profile update payload; omitted fields keep their current value
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub weight_kg: Option<f32>,
    pub height_cm: Option<f32>,
    pub goal: Option<String>,
}

/// GET /api/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<Profile>> {
    let cache_key = keys::profile(&user.user_id);
    let ttl = state.caches.user.default_ttl();

    let profile = state
        .caches
        .user
        .get_or_compute(&cache_key, ttl, || async {
            state
                .store
                .get_profile(&user.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("profile".to_string()))
        })
        .await?;

    Ok(Json(profile))
}

/// PUT /api/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> AppResult<Json<Profile>> {
    let current = state.store.get_profile(&user.user_id).await?;

    let updated = Profile {
        user_id: user.user_id.clone(),
        display_name: request
            .display_name
            .or_else(|| current.as_ref().map(|p| p.display_name.clone()))
            .unwrap_or_else(|| user.name.clone().unwrap_or_else(|| user.email.clone())),
        weight_kg: request.weight_kg.or(current.as_ref().and_then(|p| p.weight_kg)),
        height_cm: request.height_cm.or(current.as_ref().and_then(|p| p.height_cm)),
        goal: request.goal.or(current.as_ref().and_then(|p| p.goal.clone())),
    };

    let profile = state.store.upsert_profile(updated).await?;

    // Drop the cached copy; the next read goes back to the store.
    let invalidated = state.caches.user.delete(&keys::profile(&user.user_id));
    debug!(user_id = %user.user_id, invalidated, "Profile updated");

    Ok(Json(profile))
}
