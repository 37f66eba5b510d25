use crate::{
    cache::CacheManager,
    config::Config,
    error::AppError,
    health::HealthService,
    hubspot::{HubSpotFlows, ItemFetcher},
    routes::{create_health_routes, create_hubspot_routes},
    shutdown::ShutdownCoordinator,
};
use axum::{Router, http::HeaderValue};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct Server {
    pub config: Arc<Config>,
    pub cache: Arc<CacheManager>,
    pub hubspot: Arc<HubSpotFlows>,
    pub items: Arc<ItemFetcher>,
    pub health_service: Arc<HealthService>,
    pub shutdown_coordinator: ShutdownCoordinator,
}

impl Server {
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let cache = CacheManager::new_from_config(&config.cache).await?;
        info!("Cache backend initialized: {}", cache.backend_type());
        Self::with_cache(config, cache).await
    }

    /// Build a server around an existing cache backend
    pub async fn with_cache(config: Config, cache: CacheManager) -> Result<Self, AppError> {
        let cache = Arc::new(cache);
        let hubspot = Arc::new(HubSpotFlows::new(config.hubspot.clone(), cache.clone())?);
        let items = Arc::new(ItemFetcher::new(&config.hubspot)?);

        let health_service = Arc::new(HealthService::new());
        health_service.register(cache.clone()).await;

        Ok(Self {
            config: Arc::new(config),
            cache,
            hubspot,
            items,
            health_service,
            shutdown_coordinator: ShutdownCoordinator::new(),
        })
    }

    pub fn create_app(&self) -> Router {
        Router::new()
            .merge(create_health_routes())
            .nest("/integrations/hubspot", create_hubspot_routes())
            .layer(self.cors_layer())
            .with_state(self.clone())
    }

    fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .config
            .cors
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
    }

    fn spawn_cache_cleanup(&self) -> tokio::task::JoinHandle<()> {
        let cache = self.cache.clone();
        let interval_secs = self.config.cache.cleanup_interval.max(1);
        let mut shutdown_rx = self.shutdown_coordinator.subscribe();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let purged = cache.purge_expired().await;
                        if purged > 0 {
                            debug!("Purged {} expired cache entries", purged);
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        })
    }

    pub async fn run(&self) -> Result<(), AppError> {
        let app = self.create_app();

        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bind to address: {}", e)))?;

        info!("Server listening on http://{}", addr);

        let cleanup_task = self.spawn_cache_cleanup();

        let shutdown_coordinator = self.shutdown_coordinator.clone();
        tokio::spawn(async move {
            shutdown_coordinator.wait_for_shutdown_signal().await;
        });

        let mut shutdown_rx = self.shutdown_coordinator.subscribe();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
                info!("Graceful shutdown initiated");
            })
            .await;

        if let Err(e) = result {
            error!("Server error: {}", e);
        }

        self.shutdown_coordinator.initiate_shutdown();
        if let Err(e) = cleanup_task.await {
            warn!("Cache cleanup task ended abnormally: {}", e);
        }

        info!("Server shutdown complete");
        Ok(())
    }
}
