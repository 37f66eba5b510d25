use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_backend")]
    pub backend: String,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default)]
    pub redis_key_prefix: String,
    /// Seconds between sweeps of expired in-memory entries
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
}

fn default_cache_backend() -> String {
    "memory".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_cleanup_interval() -> u64 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            redis_url: default_redis_url(),
            redis_key_prefix: String::new(),
            cleanup_interval: default_cleanup_interval(),
        }
    }
}
