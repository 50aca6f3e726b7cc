//! Meal logging, daily summary, and profile integration tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::TestApp;
use crate::mocks;

fn meal_body(name: &str, calories: u32, protein_g: f32) -> Value {
    json!({
        "name": name,
        "meal_type": "lunch",
        "calories": calories,
        "protein_g": protein_g,
        "carbs_g": 10.0,
        "fat_g": 5.0
    })
}

#[tokio::test]
async fn test_log_and_list_meals() {
    let app = TestApp::spawn().await;
    mocks::mock_userinfo(&app.auth).await;

    let created = app
        .server
        .post("/api/meals")
        .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
        .json(&meal_body("grilled salmon", 450, 40.0))
        .await;
    created.assert_status(StatusCode::CREATED);

    let body: Value = created.json();
    assert_eq!(body["name"].as_str().unwrap(), "grilled salmon");
    assert!(body["id"].as_str().is_some());

    let list = app
        .server
        .get("/api/meals")
        .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
        .await;
    list.assert_status_ok();

    let body: Value = list.json();
    assert_eq!(body["meals"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_meal_without_name_is_a_400() {
    let app = TestApp::spawn().await;
    mocks::mock_userinfo(&app.auth).await;

    let response = app
        .server
        .post("/api/meals")
        .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
        .json(&meal_body("   ", 100, 1.0))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_summary_is_invalidated_when_a_meal_is_logged() {
    let app = TestApp::spawn().await;
    mocks::mock_userinfo(&app.auth).await;

    app.server
        .post("/api/meals")
        .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
        .json(&meal_body("breakfast bowl", 400, 20.0))
        .await
        .assert_status(StatusCode::CREATED);

    // Prime the summary cache.
    let summary: Value = app
        .server
        .get("/api/meals/summary")
        .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
        .await
        .json();
    assert_eq!(summary["meal_count"].as_u64().unwrap(), 1);
    assert_eq!(summary["total_calories"].as_u64().unwrap(), 400);

    // Logging another meal drops the cached summary for the day.
    app.server
        .post("/api/meals")
        .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
        .json(&meal_body("protein shake", 250, 30.0))
        .await
        .assert_status(StatusCode::CREATED);

    let summary: Value = app
        .server
        .get("/api/meals/summary")
        .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
        .await
        .json();
    assert_eq!(summary["meal_count"].as_u64().unwrap(), 2);
    assert_eq!(summary["total_calories"].as_u64().unwrap(), 650);
    assert_eq!(summary["total_protein_g"].as_f64().unwrap(), 50.0);
}

#[tokio::test]
async fn test_profile_missing_is_a_404() {
    let app = TestApp::spawn().await;
    mocks::mock_userinfo(&app.auth).await;

    let response = app
        .server
        .get("/api/profile")
        .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_update_then_read() {
    let app = TestApp::spawn().await;
    mocks::mock_userinfo(&app.auth).await;

    let updated = app
        .server
        .put("/api/profile")
        .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
        .json(&json!({
            "display_name": "Test User",
            "weight_kg": 82.5,
            "goal": "gain_muscle"
        }))
        .await;
    updated.assert_status_ok();

    let profile: Value = app
        .server
        .get("/api/profile")
        .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
        .await
        .json();

    assert_eq!(profile["display_name"].as_str().unwrap(), "Test User");
    assert_eq!(profile["weight_kg"].as_f64().unwrap(), 82.5);
    assert_eq!(profile["goal"].as_str().unwrap(), "gain_muscle");
}

#[tokio::test]
async fn test_profile_update_invalidates_cached_read() {
    let app = TestApp::spawn().await;
    mocks::mock_userinfo(&app.auth).await;

    app.server
        .put("/api/profile")
        .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
        .json(&json!({"display_name": "Before", "weight_kg": 80.0}))
        .await
        .assert_status_ok();

    // Prime the profile cache.
    let profile: Value = app
        .server
        .get("/api/profile")
        .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
        .await
        .json();
    assert_eq!(profile["display_name"].as_str().unwrap(), "Before");

    // An update must not leave the stale copy behind.
    app.server
        .put("/api/profile")
        .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
        .json(&json!({"display_name": "After"}))
        .await
        .assert_status_ok();

    let profile: Value = app
        .server
        .get("/api/profile")
        .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
        .await
        .json();
    assert_eq!(profile["display_name"].as_str().unwrap(), "After");
    // Fields omitted from the update keep their previous values.
    assert_eq!(profile["weight_kg"].as_f64().unwrap(), 80.0);
}

#[tokio::test]
async fn test_token_verification_is_cached() {
    let app = TestApp::spawn().await;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user_123",
            "email": "test@test.com",
        })))
        .expect(1)
        .mount(&app.auth)
        .await;

    for _ in 0..3 {
        app.server
            .get("/api/meals")
            .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
            .await
            .assert_status_ok();
    }
}
