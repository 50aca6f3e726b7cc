//! Food database client
//!
//! HTTP client for the external food/nutrition database. Search calls
//! carry a fixed 10 second timeout; results are cached upstream of this
//! client, so every call here is a real network round trip.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::{
    config::Config,
    error::{AppError, AppResult},
};

/// Fixed timeout for food search requests
pub const SEARCH_TIMEOUT_SECS: u64 = 10;

/// Longest query forwarded upstream
const MAX_QUERY_LEN: usize = 100;

static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s\-]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a raw search query before it becomes a cache key or an
/// upstream parameter: lowercase, strip disallowed characters, collapse
/// whitespace, cap the length.
pub fn sanitize_query(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let collapsed = WHITESPACE.replace_all(stripped.trim(), " ");
    collapsed.chars().take(MAX_QUERY_LEN).collect()
}

/// One food item returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub serving: Option<String>,
    pub calories: f32,
    pub protein_g: f32,
    pub carbs_g: f32,
    pub fat_g: f32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    foods: Vec<FoodItem>,
}

/// Food database API client
pub struct FoodDataClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl FoodDataClient {
    /// Create a new food database client with its own 10s-timeout HTTP client
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: config.food_api_url.clone(),
            api_key: config.food_api_key.clone(),
        })
    }

    /// Search the food database; `query` must already be sanitized
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(&self, query: &str) -> AppResult<Vec<FoodItem>> {
        let url = format!("{}/foods/search", self.base_url);

        debug!(url = %url, "Searching food database");

        let mut request = self.client.get(&url).query(&[("query", query)]);
        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Failed to reach food database");
            e
        })?;

        let status = response.status();
        debug!(status = %status, "Food database response status");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %text, "Food search request failed");
            return Err(AppError::Upstream(format!(
                "Food database error {}: {}",
                status, text
            )));
        }

        let body = response.text().await?;

        let result: SearchResponse = match serde_json::from_str(&body) {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, body = %body, "Failed to parse food search response");
                return Err(AppError::Upstream(format!(
                    "Failed to parse food database response: {}",
                    e
                )));
            }
        };

        debug!(results = result.foods.len(), "Food search completed");
        Ok(result.foods)
    }
}
