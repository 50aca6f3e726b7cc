//! External auth provider integration

pub mod client;

pub use client::{AuthClient, UserProfile};
