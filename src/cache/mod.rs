//! Caching layer
//!
//! Named in-memory TTL caches guard the expensive operations: AI plan
//! generation, food database search, and user/profile lookups.

pub mod keys;
pub mod ttl;

pub use ttl::{CacheStats, TtlCache};
