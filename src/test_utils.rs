use crate::{cache::CacheManager, config::Config, server::Server};

/// Test server builder for creating test instances with an in-memory cache
pub struct TestServerBuilder {
    config: Config,
    cache: Option<CacheManager>,
}

impl TestServerBuilder {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.hubspot.client_id = "test-client-id".to_string();
        config.hubspot.client_secret = "test-client-secret".to_string();
        Self {
            config,
            cache: None,
        }
    }

    /// Set a custom configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Share a cache with the test so it can inspect or seed entries
    pub fn with_cache(mut self, cache: CacheManager) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Point the token and CRM endpoints at a mock server
    pub fn with_hubspot_base_url(mut self, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        self.config.hubspot.token_url = format!("{}/oauth/v1/token", base_url);
        self.config.hubspot.items_url = format!("{}/crm/v3/objects/companies", base_url);
        self
    }

    pub fn with_pkce(mut self) -> Self {
        self.config.hubspot.pkce = true;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.config.hubspot.max_pages = max_pages;
        self
    }

    pub async fn build(self) -> Server {
        let mut config = self.config;
        config.cache.backend = "memory".to_string();

        let cache = self.cache.unwrap_or_else(CacheManager::new_memory);
        Server::with_cache(config, cache)
            .await
            .expect("failed to build test server")
    }
}

impl Default for TestServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
