//! Mock upstream responders
//!
//! Wiremock fixtures for the three external services: the auth
//! provider, the chat-completions model endpoint, and the food
//! database.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::constants;

/// Mount a successful /userinfo responder for the default test user
pub async fn mock_userinfo(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": constants::TEST_USER_ID,
            "email": constants::TEST_EMAIL,
            "name": "Test User",
        })))
        .mount(server)
        .await;
}

/// Mount a /userinfo responder for a specific user id
pub async fn mock_userinfo_for(server: &MockServer, user_id: &str, email: &str) {
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": user_id,
            "email": email,
        })))
        .mount(server)
        .await;
}

/// Mount a /userinfo responder rejecting every token
pub async fn mock_userinfo_unauthorized(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(server)
        .await;
}

/// A small valid meal plan as model output text
pub fn meal_plan_content() -> String {
    json!([
        {
            "day": 1,
            "meals": [
                {
                    "name": "Oatmeal with berries",
                    "description": "Rolled oats, blueberries, almond milk",
                    "calories": 350,
                    "protein_g": 12,
                    "carbs_g": 60,
                    "fat_g": 6
                },
                {
                    "name": "Grilled chicken salad",
                    "description": "Chicken breast, mixed greens, olive oil",
                    "calories": 520,
                    "protein_g": 42,
                    "carbs_g": 18,
                    "fat_g": 28
                }
            ]
        }
    ])
    .to_string()
}

/// A small valid workout plan as model output text
pub fn workout_plan_content() -> String {
    json!([
        {
            "day": 1,
            "focus": "full body",
            "exercises": [
                {"name": "Squat", "sets": 3, "reps": "8-12", "rest_seconds": 90},
                {"name": "Push-up", "sets": 3, "reps": "10-15", "rest_seconds": 60}
            ]
        }
    ])
    .to_string()
}

/// Wrap model output text in a chat-completions response body
pub fn chat_body(content: &str) -> Value {
    json!({
        "choices": [
            {"message": {"role": "assistant", "content": content}}
        ]
    })
}

/// Mount a successful chat-completions responder for any model
pub async fn mock_chat_success(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(content)))
        .mount(server)
        .await;
}

/// Mount a chat-completions responder for one model id only
pub async fn mock_chat_success_for_model(server: &MockServer, model: &str, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": model})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(content)))
        .mount(server)
        .await;
}

/// Mount a failing chat-completions responder for one model id,
/// answering at most `times` requests before falling through to later
/// mounts.
pub async fn mock_chat_failure_for_model(server: &MockServer, model: &str, status: u16, times: u64) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": model})))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream unhappy"))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

/// Mount a food search responder for a specific query
pub async fn mock_food_search(server: &MockServer, query: &str) {
    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .and(query_param("query", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "foods": [
                {
                    "name": format!("{} (generic)", query),
                    "brand": null,
                    "serving": "100 g",
                    "calories": 165.0,
                    "protein_g": 31.0,
                    "carbs_g": 0.0,
                    "fat_g": 3.6
                }
            ]
        })))
        .mount(server)
        .await;
}
