use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use hubspot_bridge::{Server, test_utils::TestServerBuilder};
use serde_json::Value;
use std::collections::HashMap;
use tower::ServiceExt;
use wiremock::MockServer;

/// Test harness pairing the application router with a mock HubSpot API
pub struct TestHarness {
    #[allow(dead_code)]
    pub server: Server,
    pub app: Router,
    pub hubspot: MockServer,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_builder(|builder| builder).await
    }

    /// Customize the server builder before it is pointed at the mock API
    pub async fn with_builder<F>(customize: F) -> Self
    where
        F: FnOnce(TestServerBuilder) -> TestServerBuilder,
    {
        let hubspot = MockServer::start().await;
        let server = customize(TestServerBuilder::new())
            .with_hubspot_base_url(&hubspot.uri())
            .build()
            .await;
        let app = server.create_app();

        Self {
            server,
            app,
            hubspot,
        }
    }

    /// POST a url-encoded form and return status plus raw body
    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> (StatusCode, String) {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    /// Run the authorize step and return the query of the consent URL
    #[allow(dead_code)]
    pub async fn authorize(&self, user_id: &str, org_id: &str) -> HashMap<String, String> {
        let (status, body) = self
            .post_form(
                "/integrations/hubspot/authorize",
                &[("user_id", user_id), ("org_id", org_id)],
            )
            .await;
        assert_eq!(status, StatusCode::OK, "authorize failed: {}", body);

        let url: String = serde_json::from_str(&body).unwrap();
        url::Url::parse(&url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }
}

#[allow(dead_code)]
pub fn parse_json(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}
