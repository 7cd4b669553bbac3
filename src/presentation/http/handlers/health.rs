//! Health Check Handlers
//!
//! Liveness and readiness probes.
//!
//! # Endpoints
//! - `GET /health` - Basic health check
//! - `GET /health/live` - Liveness probe (is the process running?)
//! - `GET /health/ready` - Readiness probe (are the backing stores reachable?)

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::time::Instant;

use crate::infrastructure::{cache, database};
use crate::startup::AppState;

static SERVER_START: Lazy<Instant> = Lazy::new(Instant::now);
static SERVER_START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Pin the uptime origin to process start rather than the first probe
pub fn init_server_start() {
    Lazy::force(&SERVER_START);
    Lazy::force(&SERVER_START_TIME);
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: ServiceHealth,
    pub redis: ServiceHealth,
}

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    /// Dependency switched off in configuration
    Disabled,
}

impl ServiceHealth {
    fn from_probe<E: std::fmt::Display>(
        result: Result<(), E>,
        started: Instant,
        slow_after_ms: u64,
        label: &str,
    ) -> Self {
        match result {
            Ok(()) => {
                let latency = started.elapsed().as_millis() as u64;
                Self {
                    status: if latency < slow_after_ms {
                        HealthStatus::Healthy
                    } else {
                        HealthStatus::Degraded
                    },
                    latency_ms: Some(latency),
                    message: None,
                }
            }
            Err(e) => Self {
                status: HealthStatus::Unhealthy,
                latency_ms: None,
                message: Some(format!("{} connection failed: {}", label, e)),
            },
        }
    }

    fn disabled() -> Self {
        Self {
            status: HealthStatus::Disabled,
            latency_ms: None,
            message: None,
        }
    }
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Returns 503 when the database is unreachable
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let (database, redis) = futures::join!(check_database(&state), check_redis(&state));
    let status = overall_status(&database, &redis);

    let response = ReadinessResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: SERVER_START.elapsed().as_secs(),
        started_at: SERVER_START_TIME.to_rfc3339(),
        checks: HealthChecks { database, redis },
    };

    let code = match status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    (code, Json(response))
}

async fn check_database(state: &AppState) -> ServiceHealth {
    let started = Instant::now();
    ServiceHealth::from_probe(database::ping(&state.db).await, started, 100, "Database")
}

async fn check_redis(state: &AppState) -> ServiceHealth {
    let Some(conn) = &state.redis else {
        return ServiceHealth::disabled();
    };
    let started = Instant::now();
    ServiceHealth::from_probe(cache::ping(conn).await, started, 50, "Redis")
}

/// The database is required; Redis only degrades service.
fn overall_status(database: &ServiceHealth, redis: &ServiceHealth) -> HealthStatus {
    match (database.status, redis.status) {
        (HealthStatus::Unhealthy, _) => HealthStatus::Unhealthy,
        (HealthStatus::Degraded, _) => HealthStatus::Degraded,
        (_, HealthStatus::Unhealthy | HealthStatus::Degraded) => HealthStatus::Degraded,
        _ => HealthStatus::Healthy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn health(status: HealthStatus) -> ServiceHealth {
        ServiceHealth {
            status,
            latency_ms: None,
            message: None,
        }
    }

    #[test]
    fn test_health_status_serialization() {
        let json = serde_json::to_string(&HealthStatus::Disabled).unwrap();
        assert_eq!(json, "\"disabled\"");
    }

    #[test_case(HealthStatus::Healthy, HealthStatus::Healthy, HealthStatus::Healthy)]
    #[test_case(HealthStatus::Healthy, HealthStatus::Disabled, HealthStatus::Healthy)]
    #[test_case(HealthStatus::Healthy, HealthStatus::Unhealthy, HealthStatus::Degraded)]
    #[test_case(HealthStatus::Degraded, HealthStatus::Healthy, HealthStatus::Degraded)]
    #[test_case(HealthStatus::Unhealthy, HealthStatus::Healthy, HealthStatus::Unhealthy)]
    fn test_overall_status(db: HealthStatus, redis: HealthStatus, expected: HealthStatus) {
        assert_eq!(overall_status(&health(db), &health(redis)), expected);
    }

    #[test]
    fn test_probe_failure_is_unhealthy() {
        let result: Result<(), &str> = Err("refused");
        let health = ServiceHealth::from_probe(result, Instant::now(), 100, "Database");
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(health.message.as_deref(), Some("Database connection failed: refused"));
    }
}
