mod common;

use axum::http::StatusCode;
use common::{TestHarness, parse_json};

#[tokio::test]
async fn test_root_ping() {
    let harness = TestHarness::new().await;
    let (status, body) = harness.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(&body), serde_json::json!({"Ping": "Pong"}));
}

#[tokio::test]
async fn test_health_single_checker() {
    let harness = TestHarness::new().await;
    let (status, body) = harness.get("/health?check=cache").await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(&body);
    assert_eq!(json["service"], "hubspot-bridge");
    assert!(json["checks"]["cache"].is_object());
}
