//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::Settings;
use crate::infrastructure::cache::{self, RedisCache, RedisCatalogCache};
use crate::infrastructure::database;
use crate::presentation::http::{handlers::health, routes};
use crate::presentation::middleware::{create_cors_layer, trace_layer, SecurityHeadersConfig, SecurityHeadersLayer};
use crate::shared::snowflake::SnowflakeGenerator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// `None` when Redis is disabled; rate limiting and caching are skipped
    pub redis: Option<ConnectionManager>,
    pub snowflake: Arc<SnowflakeGenerator>,
    pub catalog_cache: Arc<RedisCatalogCache>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: PgPool, redis: Option<ConnectionManager>, settings: Settings) -> Self {
        let snowflake = Arc::new(SnowflakeGenerator::with_epoch(
            settings.snowflake.machine_id as u64,
            0,
            settings.snowflake.epoch,
        ));
        let catalog_cache = Arc::new(RedisCatalogCache::new(
            redis.clone().map(|conn| RedisCache::new(conn, "salon:")),
            std::time::Duration::from_secs(settings.redis.catalog_ttl_secs),
        ));

        Self {
            db,
            redis,
            snowflake,
            catalog_cache,
            settings: Arc::new(settings),
        }
    }
}

/// Full router with the cross-cutting layers applied
pub fn build_router(state: AppState) -> Router {
    let security = SecurityHeadersConfig::for_environment(&state.settings.environment);
    let cors = create_cors_layer(&state.settings.cors);

    routes::create_router(state)
        .layer(CompressionLayer::new())
        .layer(trace_layer())
        .layer(cors)
        .layer(SecurityHeadersLayer::new(&security))
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        if settings.database.run_migrations {
            database::run_migrations(&db).await?;
            tracing::info!("Database migrations applied");
        }

        let redis = if settings.redis.enabled {
            Some(cache::create_redis_client(&settings.redis).await?)
        } else {
            tracing::warn!("Redis disabled; rate limiting and catalog caching are off");
            None
        };

        let addr = settings.server.socket_addr()?;
        let router = build_router(AppState::new(db, redis, settings));

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(
            self.listener,
            self.router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
