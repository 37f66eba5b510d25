use super::{CacheError, CacheResult};
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::warn;

/// Redis cache sharing one multiplexed connection, reopened after transport failures
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
    connection: Arc<Mutex<Option<MultiplexedConnection>>>,
    key_prefix: String,
}

impl RedisCache {
    /// Create new Redis cache without touching the network
    pub fn new(redis_url: &str, key_prefix: String) -> CacheResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("Redis client creation failed: {}", e)))?;

        Ok(Self {
            client,
            connection: Arc::new(Mutex::new(None)),
            key_prefix,
        })
    }

    /// Create the cache and ping the server so a bad URL fails at startup
    pub async fn connect(redis_url: &str, key_prefix: String) -> CacheResult<Self> {
        let cache = Self::new(redis_url, key_prefix)?;
        cache.health_check().await?;
        Ok(cache)
    }

    /// Hand out a clone of the shared multiplexed connection, opening it on first use
    async fn get_connection(&self) -> CacheResult<MultiplexedConnection> {
        let mut conn_guard = self.connection.lock().await;

        if let Some(conn) = conn_guard.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self
            .client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| CacheError::Connection(format!("Connection failed: {}", e)))?;
        *conn_guard = Some(conn.clone());
        Ok(conn)
    }

    /// Drop the shared connection after a transport failure so the next call reconnects
    async fn check<T>(&self, result: redis::RedisResult<T>) -> CacheResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
                    warn!("Redis connection lost, reconnecting on next use: {}", e);
                    self.connection.lock().await.take();
                }
                Err(CacheError::Cache(e.to_string()))
            }
        }
    }

    #[cfg(test)]
    async fn has_connection(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    fn prefixed_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    pub async fn health_check(&self) -> CacheResult<()> {
        let mut conn = self.get_connection().await?;
        let result: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        self.check(result)
            .await
            .map_err(|e| CacheError::Cache(format!("Ping failed: {}", e)))?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let key = self.prefixed_key(key);
        let mut conn = self.get_connection().await?;

        let result = conn.get(&key).await;
        self.check(result).await
    }

    pub async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let key = self.prefixed_key(key);
        let mut conn = self.get_connection().await?;

        let result: redis::RedisResult<()> = match ttl {
            // SETEX rejects a zero expiry
            Some(ttl) => conn.set_ex(&key, value, ttl.as_secs().max(1)).await,
            None => conn.set(&key, value).await,
        };
        self.check(result).await
    }

    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        let key = self.prefixed_key(key);
        let mut conn = self.get_connection().await?;

        let result: redis::RedisResult<()> = conn.del(&key).await;
        self.check(result).await
    }

    pub async fn exists(&self, key: &str) -> CacheResult<bool> {
        let key = self.prefixed_key(key);
        let mut conn = self.get_connection().await?;

        let result = conn.exists(&key).await;
        self.check(result).await
    }

    /// Atomic read-and-delete (requires Redis 6.2+ for GETDEL)
    pub async fn take(&self, key: &str) -> CacheResult<Option<String>> {
        let key = self.prefixed_key(key);
        let mut conn = self.get_connection().await?;

        let result = redis::cmd("GETDEL").arg(&key).query_async(&mut conn).await;
        self.check(result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_cache_new() {
        // Creating the client does not require a running server
        let result = RedisCache::new("redis://localhost:6379", "test:".to_string());
        assert!(result.is_ok());
    }

    #[test]
    fn test_redis_cache_rejects_bad_url() {
        let result = RedisCache::new("not-a-redis-url", String::new());
        assert!(matches!(result, Err(CacheError::Connection(_))));
    }

    #[test]
    fn test_redis_cache_key_prefix() {
        let cache = RedisCache::new("redis://localhost:6379", "test:".to_string()).unwrap();
        assert_eq!(cache.prefixed_key("hubspot_state:o:u"), "test:hubspot_state:o:u");
    }

    #[tokio::test]
    async fn test_unreachable_server_leaves_no_connection() {
        // port 1 is never a Redis server
        let cache = RedisCache::new("redis://127.0.0.1:1", String::new()).unwrap();
        let result = cache.get("key").await;
        assert!(matches!(result, Err(CacheError::Connection(_))));
        assert!(!cache.has_connection().await);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_concurrent_operations_share_connection() {
        let cache = RedisCache::connect("redis://localhost:6379", "test:".to_string())
            .await
            .unwrap();
        assert!(cache.has_connection().await);

        let (a, b) = tokio::join!(
            cache.set("pair_a", "a".to_string(), Some(Duration::from_secs(60))),
            cache.set("pair_b", "b".to_string(), Some(Duration::from_secs(60))),
        );
        a.unwrap();
        b.unwrap();

        let (a, b) = tokio::join!(cache.take("pair_a"), cache.take("pair_b"));
        assert_eq!(a.unwrap(), Some("a".to_string()));
        assert_eq!(b.unwrap(), Some("b".to_string()));
        assert!(cache.has_connection().await);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_redis_cache_operations() {
        let cache = RedisCache::connect("redis://localhost:6379", "test:".to_string())
            .await
            .unwrap();

        cache.set("key", "value".to_string(), None).await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), Some("value".to_string()));
        assert!(cache.exists("key").await.unwrap());

        assert_eq!(cache.take("key").await.unwrap(), Some("value".to_string()));
        assert_eq!(cache.get("key").await.unwrap(), None);

        cache
            .set("ttl_key", "v".to_string(), Some(Duration::from_secs(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(cache.get("ttl_key").await.unwrap(), None);
    }
}
