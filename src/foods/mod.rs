//! Food database search integration

pub mod client;

pub use client::{sanitize_query, FoodDataClient, FoodItem};
