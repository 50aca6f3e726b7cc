//! Health endpoint tests

use serde_json::Value;

use crate::common::TestApp;
use crate::mocks;

#[tokio::test]
async fn test_health_reports_cache_stats() {
    let app = TestApp::spawn().await;

    let response = app.server.get("/health").await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["status"].as_str().unwrap(), "healthy");
    assert!(json["version"].as_str().is_some());

    for cache in ["ai", "food", "user", "general"] {
        let stats = &json["caches"][cache];
        assert_eq!(stats["size"].as_u64().unwrap(), 0);
        assert!(stats["max_size"].as_u64().unwrap() > 0, "cache {}", cache);
    }
}

#[tokio::test]
async fn test_health_requires_no_auth() {
    let app = TestApp::spawn().await;

    // No Authorization header at all.
    let response = app.server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_metrics_endpoint_is_public() {
    let app = TestApp::spawn().await;

    let response = app.server.get("/metrics").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_health_cache_sizes_grow_with_use() {
    let app = TestApp::spawn().await;
    mocks::mock_userinfo(&app.auth).await;
    mocks::mock_food_search(&app.food, "apple").await;

    let response = app
        .server
        .get("/api/foods/search")
        .add_query_param("q", "apple")
        .add_header("authorization".parse().unwrap(), app.bearer().parse().unwrap())
        .await;
    response.assert_status_ok();

    let json: Value = app.server.get("/health").await.json();
    assert_eq!(json["caches"]["food"]["size"].as_u64().unwrap(), 1);
    // Token verification landed in the user cache.
    assert_eq!(json["caches"]["user"]["size"].as_u64().unwrap(), 1);
}
