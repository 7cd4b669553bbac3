//! Rate Limiting Middleware
//!
//! Sliding-window limiter stored in Redis sorted sets. Each request adds a
//! timestamped member; members older than the window are trimmed before
//! counting. Check and insert run in one Lua script so concurrent requests
//! cannot both take the last slot.
//!
//! When Redis is disabled, or a Redis call fails, requests are let through.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use once_cell::sync::Lazy;
use redis::aio::ConnectionManager;
use serde::Serialize;

use crate::config::RateLimitSettings;
use crate::infrastructure::cache::keys;
use crate::presentation::middleware::auth::AuthUser;
use crate::shared::error::ErrorResponse;
use crate::startup::AppState;

static SLIDING_WINDOW: Lazy<redis::Script> = Lazy::new(|| {
    redis::Script::new(
        r#"
        local key = KEYS[1]
        local now_ms = tonumber(ARGV[1])
        local window_ms = tonumber(ARGV[2])
        local max_requests = tonumber(ARGV[3])

        redis.call('ZREMRANGEBYSCORE', key, '-inf', now_ms - window_ms)
        local current = redis.call('ZCARD', key)

        if current < max_requests then
            redis.call('ZADD', key, now_ms, now_ms .. ':' .. math.random(1000000))
            redis.call('PEXPIRE', key, window_ms + 1000)
            return {1, current + 1, 0}
        end

        local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
        local retry_ms = 0
        if oldest and #oldest >= 2 then
            retry_ms = tonumber(oldest[2]) + window_ms - now_ms
        end
        return {0, current, retry_ms}
        "#,
    )
});

/// Window and allowance for one class of endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests_per_window: u32,
    pub window_seconds: u64,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    pub fn max_requests(&self) -> u32 {
        self.requests_per_window + self.burst_allowance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointType {
    /// Login, register and token refresh
    Auth,
    /// Everything else under /api
    Api,
}

impl EndpointType {
    pub fn config(&self, settings: &RateLimitSettings) -> RateLimitConfig {
        match self {
            EndpointType::Auth => RateLimitConfig {
                requests_per_window: 5,
                window_seconds: 60,
                burst_allowance: 2,
            },
            EndpointType::Api => RateLimitConfig {
                requests_per_window: (settings.requests_per_second * 60.0).round().max(1.0) as u32,
                window_seconds: 60,
                burst_allowance: settings.burst_size,
            },
        }
    }

    fn scope(&self) -> &'static str {
        match self {
            EndpointType::Auth => "auth",
            EndpointType::Api => "api",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: i64,
    pub retry_after: u64,
}

#[derive(Debug, Serialize)]
struct RateLimitExceededResponse {
    #[serde(flatten)]
    error: ErrorResponse,
    rate_limit: RateLimitInfo,
}

#[derive(Clone)]
pub struct RateLimiter {
    redis: ConnectionManager,
    config: RateLimitConfig,
    endpoint_type: EndpointType,
}

impl RateLimiter {
    pub fn new(
        redis: ConnectionManager,
        endpoint_type: EndpointType,
        config: RateLimitConfig,
    ) -> Self {
        Self {
            redis,
            config,
            endpoint_type,
        }
    }

    /// `Ok` when the request may proceed, `Err` with retry data when limited.
    pub async fn check(&self, identifier: &str) -> Result<RateLimitInfo, RateLimitInfo> {
        let key = keys::rate_limit(self.endpoint_type.scope(), identifier);
        let now_ms = chrono::Utc::now().timestamp_millis();
        let max_requests = self.config.max_requests();
        let mut conn = self.redis.clone();

        let result: Result<(i64, i64, i64), _> = SLIDING_WINDOW
            .key(&key)
            .arg(now_ms)
            .arg(self.config.window_seconds * 1000)
            .arg(max_requests)
            .invoke_async(&mut conn)
            .await;

        match result {
            Ok((allowed, count, retry_ms)) => {
                evaluate(&self.config, now_ms, allowed == 1, count, retry_ms)
            }
            Err(e) => {
                tracing::error!(error = %e, "Rate limiter Redis error; allowing request");
                evaluate(&self.config, now_ms, true, 0, 0)
            }
        }
    }
}

fn evaluate(
    config: &RateLimitConfig,
    now_ms: i64,
    allowed: bool,
    count: i64,
    retry_ms: i64,
) -> Result<RateLimitInfo, RateLimitInfo> {
    let limit = config.max_requests();
    let count = u32::try_from(count.max(0)).unwrap_or(u32::MAX);
    let info = RateLimitInfo {
        limit,
        remaining: limit.saturating_sub(count),
        reset_at: now_ms / 1000 + config.window_seconds as i64,
        retry_after: if allowed {
            0
        } else {
            (retry_ms.max(0) as u64).div_ceil(1000)
        },
    };

    if allowed {
        Ok(info)
    } else {
        Err(info)
    }
}

/// Authenticated profile first, then forwarding headers, then the peer address.
fn extract_identifier(request: &Request, client_ip: Option<IpAddr>) -> String {
    if let Some(auth_user) = request.extensions().get::<AuthUser>() {
        return format!("user:{}", auth_user.user_id);
    }

    forwarded_ip(request.headers())
        .or(client_ip)
        .map(|ip| format!("ip:{}", ip))
        .unwrap_or_else(|| {
            tracing::warn!("Could not determine client identifier for rate limiting");
            "ip:unknown".to_string()
        })
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    // Only trustworthy behind a proxy that overwrites these headers
    let forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok());

    forwarded_for.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok())
    })
}

pub async fn rate_limit_auth(
    State(state): State<AppState>,
    connect_info: Option<Extension<ConnectInfo<SocketAddr>>>,
    request: Request,
    next: Next,
) -> Response {
    rate_limit_inner(
        state,
        connect_info.map(|Extension(ci)| ci),
        request,
        next,
        EndpointType::Auth,
    )
    .await
}

pub async fn rate_limit_api(
    State(state): State<AppState>,
    connect_info: Option<Extension<ConnectInfo<SocketAddr>>>,
    request: Request,
    next: Next,
) -> Response {
    rate_limit_inner(
        state,
        connect_info.map(|Extension(ci)| ci),
        request,
        next,
        EndpointType::Api,
    )
    .await
}

async fn rate_limit_inner(
    state: AppState,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
    endpoint_type: EndpointType,
) -> Response {
    let Some(redis) = state.redis.clone() else {
        return next.run(request).await;
    };

    let identifier = extract_identifier(&request, connect_info.map(|ci| ci.0.ip()));
    let config = endpoint_type.config(&state.settings.rate_limit);
    let limiter = RateLimiter::new(redis, endpoint_type, config);

    match limiter.check(&identifier).await {
        Ok(info) => {
            let mut response = next.run(request).await;
            add_rate_limit_headers(response.headers_mut(), &info);
            response
        }
        Err(info) => {
            tracing::warn!(
                identifier = %identifier,
                endpoint_type = ?endpoint_type,
                "Rate limit exceeded"
            );
            create_rate_limit_response(info)
        }
    }
}

fn add_rate_limit_headers(headers: &mut HeaderMap, info: &RateLimitInfo) {
    let values = [
        ("x-ratelimit-limit", info.limit.to_string()),
        ("x-ratelimit-remaining", info.remaining.to_string()),
        ("x-ratelimit-reset", info.reset_at.to_string()),
    ];
    for (name, value) in values {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    }
}

fn create_rate_limit_response(info: RateLimitInfo) -> Response {
    let retry_after = info.retry_after.max(1);
    let body = RateLimitExceededResponse {
        error: ErrorResponse {
            code: 10006,
            message: "Too many requests. Please slow down.".to_string(),
            errors: None,
        },
        rate_limit: RateLimitInfo {
            remaining: 0,
            ..info
        },
    };

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
        response.headers_mut().insert(header::RETRY_AFTER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProfileRole;
    use axum::body::Body;
    use pretty_assertions::assert_eq;

    fn api_settings() -> RateLimitSettings {
        RateLimitSettings {
            requests_per_second: 10.0,
            burst_size: 30,
        }
    }

    #[test]
    fn test_api_config_follows_settings() {
        let config = EndpointType::Api.config(&api_settings());
        assert_eq!(config.requests_per_window, 600);
        assert_eq!(config.max_requests(), 630);
    }

    #[test]
    fn test_auth_config_is_strict() {
        assert_eq!(EndpointType::Auth.config(&api_settings()).max_requests(), 7);
    }

    #[test]
    fn test_evaluate_allowed() {
        let config = EndpointType::Auth.config(&api_settings());
        let info = evaluate(&config, 120_000, true, 3, 0).unwrap();
        assert_eq!(info.remaining, 4);
        assert_eq!(info.reset_at, 180);
        assert_eq!(info.retry_after, 0);
    }

    #[test]
    fn test_evaluate_limited_rounds_retry_up() {
        let config = EndpointType::Auth.config(&api_settings());
        let info = evaluate(&config, 0, false, 7, 1_500).unwrap_err();
        assert_eq!(info.remaining, 0);
        assert_eq!(info.retry_after, 2);
    }

    #[test]
    fn test_identifier_prefers_authenticated_user() {
        let mut request = Request::builder()
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(AuthUser {
            user_id: 42,
            role: ProfileRole::Customer,
        });

        assert_eq!(extract_identifier(&request, None), "user:42");
    }

    #[test]
    fn test_identifier_uses_first_forwarded_address() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_identifier(&request, None), "ip:203.0.113.9");
    }

    #[test]
    fn test_identifier_falls_back_to_peer() {
        let request = Request::builder().body(Body::empty()).unwrap();
        let peer: IpAddr = "192.0.2.1".parse().unwrap();

        assert_eq!(extract_identifier(&request, Some(peer)), "ip:192.0.2.1");
    }

    #[test]
    fn test_limited_response_sets_retry_after() {
        let response = create_rate_limit_response(RateLimitInfo {
            limit: 7,
            remaining: 0,
            reset_at: 60,
            retry_after: 12,
        });

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "12");
    }
}
