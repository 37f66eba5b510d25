use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub details: Option<serde_json::Value>,
    pub duration_ms: Option<u64>,
}

impl HealthCheckResult {
    pub fn healthy_with_details(details: serde_json::Value) -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
            details: Some(details),
            duration_ms: None,
        }
    }

    #[cfg(test)]
    pub fn degraded(message: String) -> Self {
        Self {
            status: HealthStatus::Degraded,
            message: Some(message),
            details: None,
            duration_ms: None,
        }
    }

    pub fn unhealthy_with_details(message: String, details: serde_json::Value) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: Some(message),
            details: Some(details),
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// The name of this health check component
    fn name(&self) -> &str;

    /// Perform the health check
    async fn check(&self) -> HealthCheckResult;

    /// Optional: return static information about this component
    fn info(&self) -> Option<serde_json::Value> {
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallHealthResponse {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub checks: HashMap<String, HealthCheckResult>,
}

pub struct HealthService {
    checkers: Arc<RwLock<HashMap<String, Arc<dyn HealthChecker>>>>,
}

impl HealthService {
    pub fn new() -> Self {
        Self {
            checkers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a health checker for a specific component
    pub async fn register(&self, checker: Arc<dyn HealthChecker>) {
        let name = checker.name().to_string();
        let mut checkers = self.checkers.write().await;
        checkers.insert(name, checker);
    }

    /// Run all checks (`"all"`), a single named check, or none
    pub async fn check_health(&self, filter: Option<&str>) -> OverallHealthResponse {
        let checkers = self.checkers.read().await;
        let mut results = HashMap::new();

        let checks_to_run: Vec<_> = match filter {
            Some("all") => checkers.iter().collect(),
            Some(specific) => checkers
                .iter()
                .filter(|(name, _)| name.as_str() == specific)
                .collect(),
            None => vec![],
        };

        for (name, checker) in checks_to_run {
            let start = Instant::now();
            let result = checker.check().await;
            let duration = start.elapsed().as_millis() as u64;
            results.insert(name.clone(), result.with_duration(duration));
        }

        let overall_status = if results
            .values()
            .any(|r| r.status == HealthStatus::Unhealthy)
        {
            HealthStatus::Unhealthy
        } else if results.values().any(|r| r.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        OverallHealthResponse {
            status: overall_status,
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            checks: results,
        }
    }

    pub async fn get_registered_checkers(&self) -> Vec<String> {
        let checkers = self.checkers.read().await;
        checkers.keys().cloned().collect()
    }
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct MockHealthyChecker;

    #[async_trait]
    impl HealthChecker for MockHealthyChecker {
        fn name(&self) -> &str {
            "mock_healthy"
        }

        async fn check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy_with_details(json!({"test": "passed"}))
        }
    }

    struct MockDegradedChecker;

    #[async_trait]
    impl HealthChecker for MockDegradedChecker {
        fn name(&self) -> &str {
            "mock_degraded"
        }

        async fn check(&self) -> HealthCheckResult {
            HealthCheckResult::degraded("Slow upstream".to_string())
        }
    }

    #[tokio::test]
    async fn test_no_filter_runs_nothing() {
        let service = HealthService::new();
        service.register(Arc::new(MockDegradedChecker)).await;

        let response = service.check_health(None).await;
        assert!(response.checks.is_empty());
        assert_eq!(response.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_all_checks_aggregate_worst_status() {
        let service = HealthService::new();
        service.register(Arc::new(MockHealthyChecker)).await;
        service.register(Arc::new(MockDegradedChecker)).await;

        let response = service.check_health(Some("all")).await;
        assert_eq!(response.checks.len(), 2);
        assert_eq!(response.status, HealthStatus::Degraded);
        assert!(response.checks["mock_healthy"].duration_ms.is_some());
    }

    #[tokio::test]
    async fn test_specific_check() {
        let service = HealthService::new();
        service.register(Arc::new(MockHealthyChecker)).await;
        service.register(Arc::new(MockDegradedChecker)).await;

        let response = service.check_health(Some("mock_healthy")).await;
        assert_eq!(response.checks.len(), 1);
        assert_eq!(response.status, HealthStatus::Healthy);

        let mut names = service.get_registered_checkers().await;
        names.sort();
        assert_eq!(names, vec!["mock_degraded", "mock_healthy"]);
    }
}
