//! Ephemeral key-value cache
//!
//! Short-lived flow state (OAuth state, verifiers, credentials) lives here.
//! Every entry is JSON-encoded under a `{prefix}:{key}` string key and
//! expires on its own; nothing in this module persists beyond a TTL window.

use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::time::Duration;
use thiserror::Error;

pub mod config;
pub mod memory;
pub mod redis;

pub use typed_cache_macro::typed_cache;

use crate::cache::config::CacheConfig;
use crate::cache::memory::MemoryCache;
use crate::cache::redis::RedisCache;
use crate::health::{HealthCheckResult, HealthChecker};

/// Cache error types
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// A record type bound to a cache namespace, usually via `#[typed_cache]`
pub trait CachedObject: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// TTL applied by `TypedCache::set`
    fn default_ttl() -> Option<Duration> {
        None
    }

    /// Namespace segment of the cache key
    fn cache_prefix() -> &'static str;
}

/// Storage backend shared by every typed view
#[derive(Clone)]
pub enum CacheBackend {
    Memory(MemoryCache),
    Redis(RedisCache),
}

impl CacheBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self {
            CacheBackend::Memory(cache) => cache.get(key).await,
            CacheBackend::Redis(cache) => cache.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        match self {
            CacheBackend::Memory(cache) => cache.set(key, value, ttl).await,
            CacheBackend::Redis(cache) => cache.set(key, value, ttl).await,
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        match self {
            CacheBackend::Memory(cache) => cache.delete(key).await,
            CacheBackend::Redis(cache) => cache.delete(key).await,
        }
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        match self {
            CacheBackend::Memory(cache) => cache.exists(key).await,
            CacheBackend::Redis(cache) => cache.exists(key).await,
        }
    }

    async fn take(&self, key: &str) -> CacheResult<Option<String>> {
        match self {
            CacheBackend::Memory(cache) => cache.take(key).await,
            CacheBackend::Redis(cache) => cache.take(key).await,
        }
    }
}

/// Cache manager - owns the backend and hands out typed views
#[derive(Clone)]
pub struct CacheManager {
    config: CacheConfig,
    backend: CacheBackend,
}

impl CacheManager {
    /// Create new cache manager with memory cache (for testing/single instance)
    pub fn new_memory() -> Self {
        Self {
            config: CacheConfig {
                backend: "memory".to_string(),
                ..Default::default()
            },
            backend: CacheBackend::Memory(MemoryCache::new()),
        }
    }

    /// Create cache manager from configuration
    pub async fn new_from_config(config: &CacheConfig) -> CacheResult<Self> {
        let backend = match config.backend.as_str() {
            "memory" => CacheBackend::Memory(MemoryCache::new()),
            "redis" => CacheBackend::Redis(
                RedisCache::connect(&config.redis_url, config.redis_key_prefix.clone()).await?,
            ),
            other => {
                return Err(CacheError::Cache(format!(
                    "Unknown cache backend '{other}', expected 'memory' or 'redis'"
                )));
            }
        };

        Ok(Self {
            config: config.clone(),
            backend,
        })
    }

    /// Get a typed cache for type T
    pub fn cache<T: CachedObject>(&self) -> TypedCache<T> {
        TypedCache::new(self.backend.clone())
    }

    /// Sweep expired in-memory entries; Redis expires keys server-side
    pub async fn purge_expired(&self) -> usize {
        match &self.backend {
            CacheBackend::Memory(cache) => cache.purge_expired().await,
            CacheBackend::Redis(_) => 0,
        }
    }

    pub fn backend_type(&self) -> &str {
        &self.config.backend
    }

    pub async fn health_check(&self) -> HealthCheckResult {
        match &self.backend {
            CacheBackend::Redis(cache) => match cache.health_check().await {
                Ok(()) => HealthCheckResult::healthy_with_details(serde_json::json!({
                    "backend": "redis",
                    "status": "healthy",
                    "connection": "ok"
                })),
                Err(err) => HealthCheckResult::unhealthy_with_details(
                    "Redis health check failed".to_string(),
                    serde_json::json!({
                        "backend": "redis",
                        "status": "unhealthy",
                        "error": err.to_string()
                    }),
                ),
            },
            CacheBackend::Memory(_) => HealthCheckResult::healthy_with_details(serde_json::json!({
                "backend": "memory",
                "status": "healthy"
            })),
        }
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new_memory()
    }
}

#[async_trait::async_trait]
impl HealthChecker for CacheManager {
    fn name(&self) -> &str {
        "cache"
    }

    async fn check(&self) -> HealthCheckResult {
        self.health_check().await
    }

    fn info(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "service": "Cache Manager",
            "backend": self.backend_type()
        }))
    }
}

/// Typed view over the cache for records of type T
#[derive(Clone)]
pub struct TypedCache<T: CachedObject> {
    backend: CacheBackend,
    prefix: &'static str,
    default_ttl: Option<Duration>,
    _phantom: PhantomData<T>,
}

impl<T: CachedObject> TypedCache<T> {
    fn new(backend: CacheBackend) -> Self {
        Self {
            backend,
            prefix: T::cache_prefix(),
            default_ttl: T::default_ttl(),
            _phantom: PhantomData,
        }
    }

    /// Full backend key for `key`
    pub fn cache_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    pub async fn get(&self, key: &str) -> CacheResult<Option<T>> {
        match self.backend.get(&self.cache_key(key)).await? {
            Some(data) => decode(&data).map(Some),
            None => Ok(None),
        }
    }

    /// Set with the type's default TTL
    pub async fn set(&self, key: &str, value: &T) -> CacheResult<()> {
        self.set_with_ttl(key, value, None).await
    }

    /// Set with an explicit TTL, falling back to the type default
    pub async fn set_with_ttl(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let data =
            serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.backend
            .set(&self.cache_key(key), data, ttl.or(self.default_ttl))
            .await
    }

    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        self.backend.delete(&self.cache_key(key)).await
    }

    pub async fn exists(&self, key: &str) -> CacheResult<bool> {
        self.backend.exists(&self.cache_key(key)).await
    }

    /// Read and delete in one step; a second take returns `None`
    pub async fn take(&self, key: &str) -> CacheResult<Option<T>> {
        match self.backend.take(&self.cache_key(key)).await? {
            Some(data) => decode(&data).map(Some),
            None => Ok(None),
        }
    }
}

fn decode<T: DeserializeOwned>(data: &str) -> CacheResult<T> {
    serde_json::from_str(data).map_err(|e| CacheError::Serialization(e.to_string()))
}
