//! Food search integration tests

use axum::http::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common::TestApp;
use crate::mocks;

#[tokio::test]
async fn test_food_search_returns_results() {
    let app = TestApp::spawn().await;
    mocks::mock_userinfo(&app.auth).await;
    mocks::mock_food_search(&app.food, "chicken breast").await;

    let response = app
        .server
        .get("/api/foods/search")
        .add_query_param("q", "chicken breast")
        .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["query"].as_str().unwrap(), "chicken breast");
    let foods = body["foods"].as_array().unwrap();
    assert_eq!(foods.len(), 1);
    assert_eq!(foods[0]["protein_g"].as_f64().unwrap(), 31.0);
}

#[tokio::test]
async fn test_repeated_search_uses_the_cache() {
    let app = TestApp::spawn().await;
    mocks::mock_userinfo(&app.auth).await;

    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .and(query_param("query", "oats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "foods": [{
                "name": "oats",
                "calories": 389.0,
                "protein_g": 16.9,
                "carbs_g": 66.3,
                "fat_g": 6.9
            }]
        })))
        .expect(1)
        .mount(&app.food)
        .await;

    for _ in 0..4 {
        app.server
            .get("/api/foods/search")
            .add_query_param("q", "oats")
            .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
            .await
            .assert_status_ok();
    }
}

#[tokio::test]
async fn test_query_is_normalized_before_search_and_caching() {
    let app = TestApp::spawn().await;
    mocks::mock_userinfo(&app.auth).await;

    // The upstream only ever sees the normalized form.
    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .and(query_param("query", "chicken breast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "foods": [{
                "name": "chicken breast",
                "calories": 165.0,
                "protein_g": 31.0,
                "carbs_g": 0.0,
                "fat_g": 3.6
            }]
        })))
        .expect(1)
        .mount(&app.food)
        .await;

    // Differently messy spellings of the same query share one cache entry.
    for raw in ["  Chicken   Breast!  ", "chicken breast", "CHICKEN;  BREAST"] {
        let response = app
            .server
            .get("/api/foods/search")
            .add_query_param("q", raw)
            .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["query"].as_str().unwrap(), "chicken breast");
    }
}

#[tokio::test]
async fn test_empty_query_is_a_400() {
    let app = TestApp::spawn().await;
    mocks::mock_userinfo(&app.auth).await;

    for q in ["", "   ", "!!!"] {
        let response = app
            .server
            .get("/api/foods/search")
            .add_query_param("q", q)
            .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_upstream_failure_maps_to_bad_gateway() {
    let app = TestApp::spawn().await;
    mocks::mock_userinfo(&app.auth).await;

    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database on fire"))
        .mount(&app.food)
        .await;

    let response = app
        .server
        .get("/api/foods/search")
        .add_query_param("q", "kale")
        .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"].as_str().unwrap(), "UPSTREAM_ERROR");
}
