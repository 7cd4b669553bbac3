//! Cache Module
//!
//! Redis connection management and caching utilities:
//! - Connection manager with automatic reconnection
//! - A namespaced JSON cache over Redis
//! - The catalog cache used by the catalog service
//! - Key prefixes shared with the rate limiter

mod cache_service;
mod catalog_cache;

pub use cache_service::{Cache, CacheError, RedisCache};
pub use catalog_cache::RedisCatalogCache;

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::RedisSettings;

/// Creates a Redis connection manager with automatic reconnection.
#[instrument(skip(settings), fields(url = %settings.url))]
pub async fn create_redis_client(
    settings: &RedisSettings,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(settings.url.as_str())?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Round trip used by the readiness probe
pub async fn ping(conn: &ConnectionManager) -> Result<(), redis::RedisError> {
    let mut conn = conn.clone();
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;
    Ok(())
}

/// Cache key prefixes
pub mod keys {
    /// Active global service catalog
    pub const CATALOG: &str = "catalog:global_services";

    /// Prefix for rate limiting counters (e.g., "ratelimit:auth:ip")
    pub const RATE_LIMIT: &str = "ratelimit:";

    /// Generates a rate limit key
    #[inline]
    pub fn rate_limit(scope: &str, client: impl std::fmt::Display) -> String {
        format!("{}{}:{}", RATE_LIMIT, scope, client)
    }
}
