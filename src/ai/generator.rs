//! Retrying plan generator
//!
//! Wraps the model backend with bounded exponential-backoff retry and a
//! fallback to a cheaper model variant. Transient upstream failures
//! (overloaded / rate limited) are retried with delays of
//! `base_delay * 2^n`; any other failure aborts immediately. Only after
//! the primary model exhausts its retries on transient failures does the
//! generator switch to the fallback model and run the same bounded loop
//! once more.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::ai::client::{Classification, GenerateError, ModelBackend};
use crate::ai::plans::{
    meal_plan_prompt, parse_meal_plan, parse_workout_plan, workout_plan_prompt, MealPlanDay,
    MealPlanRequest, WorkoutDay, WorkoutPlanRequest,
};
use crate::config::Config;
use crate::error::AppResult;
use crate::routes::metrics::record_generation;
use crate::storage::Profile;

/// Bounded-retry policy shared by the primary and fallback passes
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts per model before giving up
    pub max_retries: u32,
    /// Backoff after the n-th failed attempt is `base_delay * 2^n`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Plan generator with retry, backoff, and model fallback
pub struct PlanGenerator {
    backend: Arc<dyn ModelBackend>,
    primary_model: String,
    fallback_model: String,
    policy: RetryPolicy,
}

impl PlanGenerator {
    /// Create a generator from configuration
    pub fn new(backend: Arc<dyn ModelBackend>, config: &Config) -> Self {
        Self::with_policy(
            backend,
            config.primary_model.clone(),
            config.fallback_model.clone(),
            RetryPolicy {
                max_retries: config.max_retries,
                base_delay: config.base_delay,
            },
        )
    }

    /// Create a generator with an explicit retry policy
    pub fn with_policy(
        backend: Arc<dyn ModelBackend>,
        primary_model: String,
        fallback_model: String,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            backend,
            primary_model,
            fallback_model,
            policy,
        }
    }

    /// Generate and validate a meal plan
    pub async fn generate_meal_plan(
        &self,
        request: &MealPlanRequest,
        profile: Option<&Profile>,
    ) -> AppResult<Vec<MealPlanDay>> {
        let (system, user) = meal_plan_prompt(request, profile);
        let raw = self.generate(&system, &user).await?;
        parse_meal_plan(&raw)
    }

    /// Generate and validate a workout plan
    pub async fn generate_workout_plan(
        &self,
        request: &WorkoutPlanRequest,
    ) -> AppResult<Vec<WorkoutDay>> {
        let (system, user) = workout_plan_prompt(request);
        let raw = self.generate(&system, &user).await?;
        parse_workout_plan(&raw)
    }

    /// Run the retry state machine: primary with bounded retries, then
    /// fallback with the same policy if the primary kept failing
    /// transiently.
    async fn generate(&self, system: &str, user: &str) -> AppResult<String> {
        match self.complete_with_retry(&self.primary_model, system, user).await {
            Ok(text) => {
                record_generation(&self.primary_model, "success");
                Ok(text)
            }
            Err(err) if err.classification() == Classification::Transient => {
                warn!(
                    primary = %self.primary_model,
                    fallback = %self.fallback_model,
                    error = %err,
                    "Primary model exhausted retries, switching to fallback"
                );
                record_generation(&self.primary_model, "exhausted");

                match self.complete_with_retry(&self.fallback_model, system, user).await {
                    Ok(text) => {
                        record_generation(&self.fallback_model, "success");
                        Ok(text)
                    }
                    Err(err) => {
                        record_generation(&self.fallback_model, "failed");
                        Err(err.into())
                    }
                }
            }
            Err(err) => {
                record_generation(&self.primary_model, "failed");
                Err(err.into())
            }
        }
    }

    /// Bounded retry loop against one model
    async fn complete_with_retry(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> Result<String, GenerateError> {
        let mut attempt: u32 = 0;

        loop {
            match self.backend.complete(model, system, user).await {
                Ok(text) => {
                    if attempt > 0 {
                        info!(model = %model, attempt = attempt + 1, "Generation succeeded after retry");
                    }
                    return Ok(text);
                }
                Err(err) => match err.classification() {
                    Classification::Fatal => {
                        warn!(model = %model, error = %err, "Non-retryable generation failure");
                        return Err(err);
                    }
                    Classification::Transient => {
                        attempt += 1;
                        if attempt >= self.policy.max_retries {
                            return Err(err);
                        }
                        let delay = self.policy.base_delay * 2u32.pow(attempt - 1);
                        warn!(
                            model = %model,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Transient generation failure, backing off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                },
            }
        }
    }
}
