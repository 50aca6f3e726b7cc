//! Model API client
//!
//! Chat-completions-style HTTP client for the external generation
//! service. Failures carry the upstream status so the retry layer can
//! classify them as transient (overloaded / rate limited) or fatal.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::config::Config;
use crate::error::AppError;

/// Upstream status codes treated as transient: rate limited (429),
/// unavailable (503), and overloaded (529).
const TRANSIENT_STATUSES: [u16; 3] = [429, 503, 529];

/// How a failed generation attempt should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Expected to resolve on retry (overload, throttling)
    Transient,
    /// Retrying will not help; abort immediately
    Fatal,
}

/// Failure of a single generation attempt
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("model endpoint returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("failed to reach model endpoint: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected model response shape: {0}")]
    Malformed(String),
}

impl GenerateError {
    /// Classify this failure for the retry loop
    pub fn classification(&self) -> Classification {
        match self {
            GenerateError::Upstream { status, .. } if TRANSIENT_STATUSES.contains(status) => {
                Classification::Transient
            }
            _ => Classification::Fatal,
        }
    }
}

impl From<GenerateError> for AppError {
    fn from(err: GenerateError) -> Self {
        AppError::Generation(err.to_string())
    }
}

/// Backend capable of completing a prompt against a named model
///
/// The production implementation is `ModelClient`; tests substitute a
/// scripted backend to exercise the retry state machine.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> Result<String, GenerateError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// HTTP client for the chat-completions model endpoint
pub struct ModelClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ModelClient {
    /// Create a new model client
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.model_api_url.clone(),
            api_key: config.model_api_key.clone(),
        }
    }
}

#[async_trait]
impl ModelBackend for ModelClient {
    #[instrument(skip(self, system, user), fields(model = %model))]
    async fn complete(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> Result<String, GenerateError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            GenerateError::Malformed("MODEL_API_KEY is not configured".to_string())
        })?;

        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.7,
        };

        debug!(url = %url, "Sending generation request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        debug!(status = %status, "Model endpoint response status");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Generation request failed");
            return Err(GenerateError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| GenerateError::Malformed(format!("{}: {}", e, body)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GenerateError::Malformed("response contained no choices".to_string()))?;

        Ok(content)
    }
}
