//! AI plan generation
//!
//! The model client speaks a chat-completions-style protocol; the
//! generator layers bounded retry, backoff, and model fallback on top;
//! plan types carry the structured output contract.

pub mod client;
pub mod generator;
pub mod plans;

pub use client::{Classification, GenerateError, ModelBackend, ModelClient};
pub use generator::{PlanGenerator, RetryPolicy};
