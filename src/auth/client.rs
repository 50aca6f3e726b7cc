//! Auth provider client
//!
//! HTTP client for the external auth provider. The provider owns session
//! issuance; nutrio only asks it to verify bearer tokens.

use serde::Deserialize;
use tracing::{debug, error, instrument, warn};

use crate::{
    config::Config,
    error::{AppError, AppResult},
};

/// User profile returned by the auth provider
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Auth provider API client
pub struct AuthClient {
    client: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    /// Create a new auth client
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.auth_api_url.clone(),
        }
    }

    /// Verify a bearer token and return the caller's profile
    #[instrument(skip(self, token), fields(token_len = token.len()))]
    pub async fn verify_token(&self, token: &str) -> AppResult<UserProfile> {
        let url = format!("{}/userinfo", self.base_url);

        debug!(url = %url, "Verifying token with auth provider");

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to reach auth provider");
                e
            })?;

        let status = response.status();
        debug!(status = %status, "Auth provider response status");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                warn!(status = %status, "Token rejected by auth provider");
                return Err(AppError::InvalidToken);
            }

            error!(status = %status, body = %text, "Auth provider request failed");
            return Err(AppError::Upstream(format!(
                "Auth provider error {}: {}",
                status, text
            )));
        }

        let body = response.text().await?;

        let profile: UserProfile = match serde_json::from_str(&body) {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, body = %body, "Failed to parse auth provider response");
                return Err(AppError::Upstream(format!(
                    "Failed to parse auth provider response: {}",
                    e
                )));
            }
        };

        debug!(user_id = %profile.id, email = %profile.email, "Token verified");
        Ok(profile)
    }
}
