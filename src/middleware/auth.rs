//! Authentication middleware
//!
//! Validates bearer tokens against the external auth provider and caches
//! verification results. Session issuance itself lives with the provider;
//! this middleware only verifies and attaches the caller's identity.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
    cache::keys,
    error::AppError,
    middleware::rate_limiter::{client_addr, rate_limited_response},
    AppState,
};

/// Authenticated caller identity, attached to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
}

/// Extract the Authorization header and return the bearer token
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Authentication middleware
///
/// 1. Applies the auth rate limiter keyed by client address
/// 2. Extracts the bearer token from the Authorization header
/// 3. Checks the user cache for an existing verification (keyed by token hash)
/// 4. If not cached, verifies with the auth provider and caches the result
/// 5. Adds `AuthenticatedUser` to request extensions
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Bound token-verification attempts per caller address before doing
    // any upstream work.
    let addr = client_addr(&request);
    let limit = state.limiters.auth.check(&addr);
    if !limit.allowed {
        warn!(addr = %addr, "Auth rate limit exceeded");
        return Ok(rate_limited_response(state.limiters.auth.config(), &limit));
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = extract_bearer_token(auth_header).ok_or(AppError::InvalidToken)?;

    // Cache verification results under a hash; raw tokens never become keys.
    let token_hash = keys::sha256_hex(token);
    let cache_key = keys::auth_token(&token_hash);

    if let Some(user) = state.caches.user.get::<AuthenticatedUser>(&cache_key)? {
        debug!(user_id = %user.user_id, "Token verification cache hit");
        request.extensions_mut().insert(user);
        return Ok(next.run(request).await);
    }

    debug!(token_hash = %token_hash, "Token verification cache miss, verifying");

    let profile = match state.auth_client.verify_token(token).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!(error = %e, "Token verification failed");
            return Err(e);
        }
    };

    let user = AuthenticatedUser {
        user_id: profile.id,
        email: profile.email,
        name: profile.name,
    };

    state.caches.user.set(&cache_key, &user)?;

    debug!(user_id = %user.user_id, email = %user.email, "User authenticated");

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
