//! Cache key derivation
//!
//! Keys are derived from the operation name plus its discriminators so
//! that identical logical requests always map to the same entry and
//! unrelated requests never share one. Free-form inputs (plan parameters)
//! go through a SHA-256 fingerprint instead of being embedded raw.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// AI meal plan cache key
pub fn meal_plan(user_id: &str, fingerprint: &str) -> String {
    format!("plans:meal:{}:{}", user_id, fingerprint)
}

/// AI workout plan cache key
pub fn workout_plan(user_id: &str, fingerprint: &str) -> String {
    format!("plans:workout:{}:{}", user_id, fingerprint)
}

/// Food search cache key; `query` must already be normalized
pub fn food_search(query: &str) -> String {
    format!("foods:search:{}", query)
}

/// Token verification cache key, keyed by token hash (never the raw token)
pub fn auth_token(token_hash: &str) -> String {
    format!("auth:token:{}", token_hash)
}

/// User profile cache key
pub fn profile(user_id: &str) -> String {
    format!("users:profile:{}", user_id)
}

/// Daily nutrition summary cache key
pub fn daily_summary(user_id: &str, date: &str) -> String {
    format!("users:summary:{}:{}", user_id, date)
}

/// Deterministic SHA-256 fingerprint of a serializable value
///
/// serde_json serializes struct fields in declaration order, so equal
/// values always produce equal fingerprints.
pub fn fingerprint<T: Serialize>(value: &T) -> String {
    let serialized = serde_json::to_string(value).unwrap_or_default();
    sha256_hex(&serialized)
}

/// Hex-encoded SHA-256 of a string
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
