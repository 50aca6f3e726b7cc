//! User and meal data access
//!
//! Persistence lives with an external data service; the core only needs
//! this trait. Calls made from cache compute functions are either
//! read-only or complete before their result is cached, so they are safe
//! under the duplicate-computation race. The in-memory implementation
//! backs local runs and tests.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;

/// User profile record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
    #[serde(default)]
    pub weight_kg: Option<f32>,
    #[serde(default)]
    pub height_cm: Option<f32>,
    #[serde(default)]
    pub goal: Option<String>,
}

/// Meal category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

/// A logged meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub meal_type: MealType,
    pub calories: u32,
    pub protein_g: f32,
    pub carbs_g: f32,
    pub fat_g: f32,
    pub logged_at: DateTime<Utc>,
}

/// Payload for logging a meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMealEntry {
    pub name: String,
    pub meal_type: MealType,
    pub calories: u32,
    #[serde(default)]
    pub protein_g: f32,
    #[serde(default)]
    pub carbs_g: f32,
    #[serde(default)]
    pub fat_g: f32,
    /// Defaults to now when omitted
    #[serde(default)]
    pub logged_at: Option<DateTime<Utc>>,
}

/// Data access for profiles and meal logs
#[async_trait]
pub trait MealStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> AppResult<Option<Profile>>;

    async fn upsert_profile(&self, profile: Profile) -> AppResult<Profile>;

    async fn insert_meal(&self, user_id: &str, entry: NewMealEntry) -> AppResult<MealEntry>;

    async fn list_meals(&self, user_id: &str) -> AppResult<Vec<MealEntry>>;

    async fn meals_for_day(&self, user_id: &str, date: NaiveDate) -> AppResult<Vec<MealEntry>>;
}

/// In-memory store for local runs and tests
#[derive(Default)]
pub struct InMemoryStore {
    profiles: RwLock<HashMap<String, Profile>>,
    meals: RwLock<HashMap<String, Vec<MealEntry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MealStore for InMemoryStore {
    async fn get_profile(&self, user_id: &str) -> AppResult<Option<Profile>> {
        let profiles = self.profiles.read().unwrap();
        Ok(profiles.get(user_id).cloned())
    }

    async fn upsert_profile(&self, profile: Profile) -> AppResult<Profile> {
        let mut profiles = self.profiles.write().unwrap();
        profiles.insert(profile.user_id.clone(), profile.clone());
        Ok(profile)
    }

    async fn insert_meal(&self, user_id: &str, entry: NewMealEntry) -> AppResult<MealEntry> {
        let meal = MealEntry {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name: entry.name,
            meal_type: entry.meal_type,
            calories: entry.calories,
            protein_g: entry.protein_g,
            carbs_g: entry.carbs_g,
            fat_g: entry.fat_g,
            logged_at: entry.logged_at.unwrap_or_else(Utc::now),
        };

        let mut meals = self.meals.write().unwrap();
        meals
            .entry(user_id.to_string())
            .or_default()
            .push(meal.clone());
        Ok(meal)
    }

    async fn list_meals(&self, user_id: &str) -> AppResult<Vec<MealEntry>> {
        let meals = self.meals.read().unwrap();
        Ok(meals.get(user_id).cloned().unwrap_or_default())
    }

    async fn meals_for_day(&self, user_id: &str, date: NaiveDate) -> AppResult<Vec<MealEntry>> {
        let meals = self.meals.read().unwrap();
        Ok(meals
            .get(user_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.logged_at.date_naive() == date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
