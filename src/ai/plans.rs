//! Plan request/response types, prompt building, and output validation
//!
//! Requests are explicit typed structs with defaulting rules expressed
//! as serde defaults rather than inline conditionals. A generation only
//! counts as successful once its text parses into a non-empty plan;
//! anything else is a domain failure carrying the raw text.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::storage::Profile;

fn default_days() -> u8 {
    3
}

/// Training / nutrition goal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    LoseWeight,
    #[default]
    Maintain,
    GainMuscle,
}

impl Goal {
    fn describe(&self) -> &'static str {
        match self {
            Goal::LoseWeight => "losing weight",
            Goal::Maintain => "maintaining current weight",
            Goal::GainMuscle => "gaining muscle",
        }
    }
}

/// Training experience level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Experience {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Experience {
    fn describe(&self) -> &'static str {
        match self {
            Experience::Beginner => "beginner",
            Experience::Intermediate => "intermediate",
            Experience::Advanced => "advanced",
        }
    }
}

/// Meal plan generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlanRequest {
    #[serde(default = "default_days")]
    pub days: u8,
    #[serde(default)]
    pub calories_target: Option<u32>,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    #[serde(default)]
    pub goal: Goal,
}

/// Workout plan generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutPlanRequest {
    #[serde(default = "default_days")]
    pub days: u8,
    #[serde(default)]
    pub experience: Experience,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub goal: Goal,
}

/// One meal within a generated day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedMeal {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub calories: u32,
    pub protein_g: u32,
    pub carbs_g: u32,
    pub fat_g: u32,
}

/// One day of a generated meal plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlanDay {
    pub day: u32,
    pub meals: Vec<PlannedMeal>,
}

/// One exercise within a generated workout day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedExercise {
    pub name: String,
    pub sets: u32,
    pub reps: String,
    #[serde(default)]
    pub rest_seconds: u32,
}

/// One day of a generated workout plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutDay {
    pub day: u32,
    pub focus: String,
    pub exercises: Vec<PlannedExercise>,
}

const MEAL_PLAN_SYSTEM: &str = "You are a nutrition planning assistant. Respond ONLY with a \
JSON array of day objects: [{\"day\": 1, \"meals\": [{\"name\": ..., \"description\": ..., \
\"calories\": ..., \"protein_g\": ..., \"carbs_g\": ..., \"fat_g\": ...}]}]. No prose.";

const WORKOUT_PLAN_SYSTEM: &str = "You are a fitness planning assistant. Respond ONLY with a \
JSON array of day objects: [{\"day\": 1, \"focus\": ..., \"exercises\": [{\"name\": ..., \
\"sets\": ..., \"reps\": ..., \"rest_seconds\": ...}]}]. No prose.";

/// Build system and user prompts for a meal plan
pub fn meal_plan_prompt(request: &MealPlanRequest, profile: Option<&Profile>) -> (String, String) {
    let mut user = format!(
        "Create a {}-day meal plan for someone focused on {}.",
        request.days,
        request.goal.describe()
    );

    if let Some(target) = request.calories_target {
        user.push_str(&format!(" Target roughly {} kcal per day.", target));
    }
    if !request.dietary_preferences.is_empty() {
        user.push_str(&format!(
            " Dietary preferences: {}.",
            request.dietary_preferences.join(", ")
        ));
    }
    if let Some(profile) = profile {
        if let Some(weight) = profile.weight_kg {
            user.push_str(&format!(" The person weighs {} kg.", weight));
        }
        if let Some(height) = profile.height_cm {
            user.push_str(&format!(" Height: {} cm.", height));
        }
    }

    (MEAL_PLAN_SYSTEM.to_string(), user)
}

/// Build system and user prompts for a workout plan
pub fn workout_plan_prompt(request: &WorkoutPlanRequest) -> (String, String) {
    let mut user = format!(
        "Create a {}-day workout plan for a trainee at {} level, focused on {}.",
        request.days,
        request.experience.describe(),
        request.goal.describe()
    );

    if request.equipment.is_empty() {
        user.push_str(" Assume bodyweight exercises only.");
    } else {
        user.push_str(&format!(
            " Available equipment: {}.",
            request.equipment.join(", ")
        ));
    }

    (WORKOUT_PLAN_SYSTEM.to_string(), user)
}

/// Parse generated text into a non-empty meal plan
///
/// Empty or malformed output is a domain failure (the raw text rides
/// along for diagnosis), never a retryable transport failure.
pub fn parse_meal_plan(raw: &str) -> AppResult<Vec<MealPlanDay>> {
    let days: Vec<MealPlanDay> = parse_plan_json(raw)?;
    if days.is_empty() || days.iter().any(|day| day.meals.is_empty()) {
        return Err(AppError::EmptyGeneration {
            raw: raw.to_string(),
        });
    }
    Ok(days)
}

/// Parse generated text into a non-empty workout plan
pub fn parse_workout_plan(raw: &str) -> AppResult<Vec<WorkoutDay>> {
    let days: Vec<WorkoutDay> = parse_plan_json(raw)?;
    if days.is_empty() || days.iter().any(|day| day.exercises.is_empty()) {
        return Err(AppError::EmptyGeneration {
            raw: raw.to_string(),
        });
    }
    Ok(days)
}

fn parse_plan_json<T: serde::de::DeserializeOwned>(raw: &str) -> AppResult<T> {
    serde_json::from_str(strip_code_fences(raw)).map_err(|_| AppError::EmptyGeneration {
        raw: raw.to_string(),
    })
}

/// Strip a Markdown code fence the model sometimes wraps JSON in
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
