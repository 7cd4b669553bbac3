//! Cache Service
//!
//! Namespaced JSON values in Redis with a time-to-live.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument};

/// Cache failures. Callers treat these as a miss rather than failing the request.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("codec: {0}")]
    Codec(#[from] serde_json::Error),
}

/// JSON value cache
#[async_trait]
pub trait Cache: Send + Sync {
    /// `Ok(None)` when the key is absent or has expired
    async fn get_json<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, CacheError>;

    async fn put_json<T: Serialize + Sync + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    /// Returns whether a value was removed
    async fn evict(&self, key: &str) -> Result<bool, CacheError>;
}

/// Redis-backed cache. Every key is stored under `namespace`.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    namespace: Arc<str>,
}

impl RedisCache {
    pub fn new(conn: ConnectionManager, namespace: impl Into<Arc<str>>) -> Self {
        Self {
            conn,
            namespace: namespace.into(),
        }
    }

    fn key(&self, key: &str) -> String {
        namespaced(&self.namespace, key)
    }
}

fn namespaced(namespace: &str, key: &str) -> String {
    format!("{}{}", namespace, key)
}

#[async_trait]
impl Cache for RedisCache {
    #[instrument(skip(self), level = "debug")]
    async fn get_json<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();

        let raw: Option<String> = conn.get(&key).await?;
        debug!(key = %key, hit = raw.is_some(), "Cache lookup");

        Ok(raw.map(|data| serde_json::from_str(&data)).transpose()?)
    }

    #[instrument(skip(self, value), level = "debug")]
    async fn put_json<T: Serialize + Sync + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let key = self.key(key);
        let data = serde_json::to_string(value)?;
        let mut conn = self.conn.clone();

        // SETEX rejects a zero TTL
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(&key, data, seconds).await?;
        debug!(key = %key, ttl = seconds, "Cache stored");
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn evict(&self, key: &str) -> Result<bool, CacheError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();

        let removed: u64 = conn.del(&key).await?;
        Ok(removed > 0)
    }
}
