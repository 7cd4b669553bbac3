//! Redis cache for the public service catalog.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{keys, Cache, RedisCache};
use crate::application::services::CatalogCache;
use crate::domain::GlobalService;

/// Caches the full active catalog under one key.
///
/// Without a Redis connection every call is a no-op and reads always miss.
/// Redis failures are logged and treated as a miss.
#[derive(Clone)]
pub struct RedisCatalogCache {
    cache: Option<RedisCache>,
    ttl: Duration,
}

impl RedisCatalogCache {
    pub fn new(cache: Option<RedisCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub fn disabled() -> Self {
        Self::new(None, Duration::ZERO)
    }
}

#[async_trait]
impl CatalogCache for RedisCatalogCache {
    async fn load(&self) -> Option<Vec<GlobalService>> {
        let cache = self.cache.as_ref()?;
        match cache.get_json(keys::CATALOG).await {
            Ok(services) => services,
            Err(e) => {
                warn!(error = %e, "Catalog cache read failed");
                None
            }
        }
    }

    async fn store(&self, services: &[GlobalService]) {
        let Some(cache) = &self.cache else { return };
        if let Err(e) = cache.put_json(keys::CATALOG, services, self.ttl).await {
            warn!(error = %e, "Catalog cache write failed");
        }
    }

    async fn invalidate(&self) {
        let Some(cache) = &self.cache else { return };
        if let Err(e) = cache.evict(keys::CATALOG).await {
            warn!(error = %e, "Catalog cache invalidation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_cache_always_misses() {
        let cache = RedisCatalogCache::disabled();
        cache.store(&[]).await;
        cache.invalidate().await;
        assert!(cache.load().await.is_none());
    }
}
