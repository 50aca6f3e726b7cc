//! Configuration management for nutrio
//!
//! Configuration is loaded from environment variables. Every cache and
//! rate limiter carries its own independent settings so that AI plan
//! generation, food search, and general API traffic can be tuned apart.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

/// Settings for one named cache instance
#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    /// Maximum number of entries before oldest-created eviction kicks in
    pub max_entries: usize,
    /// Default time-to-live for entries
    pub ttl: Duration,
}

/// Settings for one named rate limiter instance
#[derive(Debug, Clone, Copy)]
pub struct LimitSettings {
    /// Maximum requests allowed per window
    pub max_requests: u32,
    /// Fixed window length
    pub window: Duration,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Auth provider base URL (token verification)
    pub auth_api_url: String,

    /// Model API base URL (chat-completions style)
    pub model_api_url: String,
    /// Model API key (required for plan generation)
    pub model_api_key: Option<String>,
    /// Primary model identifier
    pub primary_model: String,
    /// Cheaper fallback model used after the primary exhausts retries
    pub fallback_model: String,
    /// Attempts per model before giving up
    pub max_retries: u32,
    /// Base delay for exponential backoff between attempts
    pub base_delay: Duration,

    /// Food database API base URL
    pub food_api_url: String,
    /// Food database API key
    pub food_api_key: Option<String>,

    /// Per-instance cache settings
    pub ai_cache: CacheSettings,
    pub food_cache: CacheSettings,
    pub user_cache: CacheSettings,
    pub general_cache: CacheSettings,

    /// Per-instance rate limiter settings
    pub ai_limit: LimitSettings,
    pub food_search_limit: LimitSettings,
    pub general_limit: LimitSettings,
    pub auth_limit: LimitSettings,

    /// Interval between background sweeps of caches and limiter windows
    pub sweep_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("NUTRIO_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("NUTRIO_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid NUTRIO_PORT")?,

            auth_api_url: env::var("AUTH_API_URL").context("AUTH_API_URL must be set")?,

            model_api_url: env::var("MODEL_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            model_api_key: env::var("MODEL_API_KEY").ok(),
            primary_model: env::var("PRIMARY_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            fallback_model: env::var("FALLBACK_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            max_retries: env_u32("AI_MAX_RETRIES", 3)?,
            base_delay: Duration::from_millis(env_u64("AI_BASE_DELAY_MS", 1000)?),

            food_api_url: env::var("FOOD_API_URL").context("FOOD_API_URL must be set")?,
            food_api_key: env::var("FOOD_API_KEY").ok(),

            ai_cache: cache_settings("AI_CACHE", 100, 1800)?,
            food_cache: cache_settings("FOOD_CACHE", 500, 3600)?,
            user_cache: cache_settings("USER_CACHE", 1000, 300)?,
            general_cache: cache_settings("GENERAL_CACHE", 200, 600)?,

            ai_limit: limit_settings("AI_LIMIT", 5, 60)?,
            food_search_limit: limit_settings("FOOD_SEARCH_LIMIT", 30, 60)?,
            general_limit: limit_settings("GENERAL_LIMIT", 100, 900)?,
            auth_limit: limit_settings("AUTH_LIMIT", 5, 900)?,

            sweep_interval: Duration::from_secs(env_u64("SWEEP_INTERVAL_SECONDS", 60)?),
        })
    }

    /// Build a config pointing at mock upstreams, with short backoff delays
    /// so retry paths run fast under test.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn for_testing(auth_url: &str, model_url: &str, food_url: &str) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            auth_api_url: auth_url.to_string(),
            model_api_url: model_url.to_string(),
            model_api_key: Some("test-model-key".to_string()),
            primary_model: "test-primary".to_string(),
            fallback_model: "test-fallback".to_string(),
            max_retries: 3,
            base_delay: Duration::from_millis(5),
            food_api_url: food_url.to_string(),
            food_api_key: Some("test-food-key".to_string()),
            ai_cache: CacheSettings {
                max_entries: 100,
                ttl: Duration::from_secs(1800),
            },
            food_cache: CacheSettings {
                max_entries: 500,
                ttl: Duration::from_secs(3600),
            },
            user_cache: CacheSettings {
                max_entries: 1000,
                ttl: Duration::from_secs(300),
            },
            general_cache: CacheSettings {
                max_entries: 200,
                ttl: Duration::from_secs(600),
            },
            ai_limit: LimitSettings {
                max_requests: 5,
                window: Duration::from_secs(60),
            },
            food_search_limit: LimitSettings {
                max_requests: 30,
                window: Duration::from_secs(60),
            },
            general_limit: LimitSettings {
                max_requests: 100,
                window: Duration::from_secs(900),
            },
            auth_limit: LimitSettings {
                max_requests: 100,
                window: Duration::from_secs(900),
            },
            sweep_interval: Duration::from_secs(60),
        }
    }
}

fn env_u32(name: &str, default: u32) -> Result<u32> {
    match env::var(name) {
        Ok(v) => v.parse().with_context(|| format!("Invalid {}", name)),
        Err(_) => Ok(default),
    }
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(v) => v.parse().with_context(|| format!("Invalid {}", name)),
        Err(_) => Ok(default),
    }
}

/// Read `<PREFIX>_MAX` / `<PREFIX>_TTL_SECONDS` with defaults
fn cache_settings(prefix: &str, max_entries: usize, ttl_seconds: u64) -> Result<CacheSettings> {
    Ok(CacheSettings {
        max_entries: env_u64(&format!("{}_MAX", prefix), max_entries as u64)? as usize,
        ttl: Duration::from_secs(env_u64(&format!("{}_TTL_SECONDS", prefix), ttl_seconds)?),
    })
}

/// Read `<PREFIX>_MAX` / `<PREFIX>_WINDOW_SECONDS` with defaults
fn limit_settings(prefix: &str, max_requests: u32, window_seconds: u64) -> Result<LimitSettings> {
    Ok(LimitSettings {
        max_requests: env_u32(&format!("{}_MAX", prefix), max_requests)?,
        window: Duration::from_secs(env_u64(
            &format!("{}_WINDOW_SECONDS", prefix),
            window_seconds,
        )?),
    })
}
