use crate::{error::AppError, server::Server};
use axum::{
    Router,
    extract::{Query, State},
    response::Json,
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
struct HealthCheckQuery {
    #[serde(default)]
    check: Option<String>,
}

/// Liveness ping and component health report
pub fn create_health_routes() -> Router<Server> {
    Router::new()
        .route("/", get(ping))
        .route("/health", get(health_check))
}

async fn ping() -> Json<Value> {
    Json(json!({"Ping": "Pong"}))
}

async fn health_check(
    State(server): State<Server>,
    Query(params): Query<HealthCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let health_response = server
        .health_service
        .check_health(params.check.as_deref())
        .await;

    let response_json = serde_json::to_value(&health_response)
        .map_err(|e| AppError::Internal(format!("Failed to serialize health response: {}", e)))?;

    Ok(Json(response_json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestServerBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let server = TestServerBuilder::new().build().await;
        let app = create_health_routes().with_state(server);

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"Ping": "Pong"}));
    }

    #[tokio::test]
    async fn test_health_check_all() {
        let server = TestServerBuilder::new().build().await;
        let app = create_health_routes().with_state(server);

        let request = Request::builder()
            .uri("/health?check=all")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "Healthy");
        assert_eq!(json["checks"]["cache"]["details"]["backend"], "memory");
    }
}
