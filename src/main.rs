//! # Salon Booking API
//!
//! Entry point: initializes tracing, loads configuration, connects to
//! PostgreSQL (and Redis when enabled) and serves the HTTP API.

use anyhow::Result;
use tracing::info;

use salon_booking::config::Settings;
use salon_booking::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    salon_booking::telemetry::init_tracing();

    info!("Starting Salon Booking API...");

    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        redis_enabled = settings.redis.enabled,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
