//! nutrio - AI-assisted nutrition and fitness backend
//!
//! This library provides the core functionality for the nutrio API
//! server: rate limiting, TTL caching, and resilient AI plan generation
//! composed in front of the expensive upstream operations.

pub mod ai;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod foods;
pub mod middleware;
pub mod routes;
pub mod storage;
pub mod tasks;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

pub use crate::ai::{ModelClient, PlanGenerator};
pub use crate::auth::AuthClient;
pub use crate::cache::TtlCache;
pub use crate::clock::{Clock, SystemClock};
pub use crate::config::Config;
pub use crate::foods::FoodDataClient;
pub use crate::middleware::rate_limiter::{FixedWindowLimiter, KeyScope, RateLimitConfig};
pub use crate::storage::{InMemoryStore, MealStore};

/// Named cache instances, one per guarded concern
///
/// Built once at process start and injected through the application
/// state; there are no module-level globals to leak across tests.
pub struct Caches {
    pub ai: Arc<TtlCache>,
    pub food: Arc<TtlCache>,
    pub user: Arc<TtlCache>,
    pub general: Arc<TtlCache>,
}

impl Caches {
    fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            ai: Arc::new(TtlCache::with_clock(
                "ai",
                config.ai_cache.max_entries,
                config.ai_cache.ttl,
                clock.clone(),
            )),
            food: Arc::new(TtlCache::with_clock(
                "food",
                config.food_cache.max_entries,
                config.food_cache.ttl,
                clock.clone(),
            )),
            user: Arc::new(TtlCache::with_clock(
                "user",
                config.user_cache.max_entries,
                config.user_cache.ttl,
                clock.clone(),
            )),
            general: Arc::new(TtlCache::with_clock(
                "general",
                config.general_cache.max_entries,
                config.general_cache.ttl,
                clock,
            )),
        }
    }

    /// All caches, for the background sweeper
    pub fn all(&self) -> [&Arc<TtlCache>; 4] {
        [&self.ai, &self.food, &self.user, &self.general]
    }
}

/// Named rate limiter instances, one per traffic class
pub struct Limiters {
    pub ai: Arc<FixedWindowLimiter>,
    pub food_search: Arc<FixedWindowLimiter>,
    pub general: Arc<FixedWindowLimiter>,
    pub auth: Arc<FixedWindowLimiter>,
}

impl Limiters {
    fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            ai: Arc::new(FixedWindowLimiter::with_clock(
                RateLimitConfig::new("ai", config.ai_limit, KeyScope::User),
                clock.clone(),
            )),
            food_search: Arc::new(FixedWindowLimiter::with_clock(
                RateLimitConfig::new("food_search", config.food_search_limit, KeyScope::User),
                clock.clone(),
            )),
            general: Arc::new(FixedWindowLimiter::with_clock(
                RateLimitConfig::new("general", config.general_limit, KeyScope::Address),
                clock.clone(),
            )),
            auth: Arc::new(FixedWindowLimiter::with_clock(
                RateLimitConfig::new("auth", config.auth_limit, KeyScope::Address),
                clock,
            )),
        }
    }

    /// All limiters, for the background sweeper
    pub fn all(&self) -> [&Arc<FixedWindowLimiter>; 4] {
        [&self.ai, &self.food_search, &self.general, &self.auth]
    }
}

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    pub caches: Caches,
    pub limiters: Limiters,
    pub auth_client: Arc<AuthClient>,
    pub generator: Arc<PlanGenerator>,
    pub food_client: Arc<FoodDataClient>,
    pub store: Arc<dyn MealStore>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        // Shared HTTP client with connection pooling; the food client
        // builds its own with a tighter fixed timeout.
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(32)
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let auth_client = Arc::new(AuthClient::new(http_client.clone(), &config));
        let model_client = Arc::new(ModelClient::new(http_client, &config));
        let generator = Arc::new(PlanGenerator::new(model_client, &config));
        let food_client = Arc::new(FoodDataClient::new(&config)?);

        Ok(Self {
            caches: Caches::new(&config, clock.clone()),
            limiters: Limiters::new(&config, clock),
            auth_client,
            generator,
            food_client,
            store: Arc::new(InMemoryStore::new()),
            start_time: Instant::now(),
            config,
        })
    }

    /// Create application state for testing with an injected clock and store
    ///
    /// Upstream clients still go through HTTP so integration tests can
    /// point them at wiremock servers via the config URLs.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_for_testing(
        config: Config,
        clock: Arc<dyn Clock>,
        store: Arc<dyn MealStore>,
    ) -> Result<Self> {
        let http_client = reqwest::Client::new();

        let auth_client = Arc::new(AuthClient::new(http_client.clone(), &config));
        let model_client = Arc::new(ModelClient::new(http_client, &config));
        let generator = Arc::new(PlanGenerator::new(model_client, &config));
        let food_client = Arc::new(FoodDataClient::new(&config)?);

        Ok(Self {
            caches: Caches::new(&config, clock.clone()),
            limiters: Limiters::new(&config, clock),
            auth_client,
            generator,
            food_client,
            store,
            start_time: Instant::now(),
            config,
        })
    }
}
