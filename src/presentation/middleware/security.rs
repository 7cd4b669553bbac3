//! Security Headers Middleware
//!
//! Adds the standard hardening headers to every response. The API only
//! serves JSON, so the content security policy forbids loading anything.

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Request, Response},
};
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};

/// Security header policy
#[derive(Clone, Debug)]
pub struct SecurityHeadersConfig {
    /// Strict-Transport-Security max-age; `None` omits the header
    pub hsts_max_age: Option<u64>,
    pub content_security_policy: String,
    pub referrer_policy: String,
    pub permissions_policy: String,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            hsts_max_age: Some(31_536_000),
            content_security_policy: "default-src 'none'; frame-ancestors 'none'".to_string(),
            referrer_policy: "no-referrer".to_string(),
            permissions_policy: "geolocation=(), microphone=(), camera=()".to_string(),
        }
    }
}

impl SecurityHeadersConfig {
    /// HSTS is only sent in production, where TLS terminates in front of us.
    pub fn for_environment(environment: &str) -> Self {
        let mut config = Self::default();
        if environment != "production" {
            config.hsts_max_age = None;
        }
        config
    }

    fn headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        let mut headers = vec![
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
            (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        ];

        if let Some(max_age) = self.hsts_max_age {
            if let Ok(value) = HeaderValue::from_str(&format!("max-age={}; includeSubDomains", max_age)) {
                headers.push((header::STRICT_TRANSPORT_SECURITY, value));
            }
        }

        let configured = [
            (header::CONTENT_SECURITY_POLICY, &self.content_security_policy),
            (header::REFERRER_POLICY, &self.referrer_policy),
            (
                HeaderName::from_static("permissions-policy"),
                &self.permissions_policy,
            ),
        ];
        for (name, value) in configured {
            // Invalid configured values are skipped
            if let Ok(value) = HeaderValue::from_str(value) {
                headers.push((name, value));
            }
        }

        headers
    }
}

/// Layer inserting a precomputed header set into each response
#[derive(Clone)]
pub struct SecurityHeadersLayer {
    headers: Arc<[(HeaderName, HeaderValue)]>,
}

impl SecurityHeadersLayer {
    pub fn new(config: &SecurityHeadersConfig) -> Self {
        Self {
            headers: config.headers().into(),
        }
    }
}

impl Default for SecurityHeadersLayer {
    fn default() -> Self {
        Self::new(&SecurityHeadersConfig::default())
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeadersMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeadersMiddleware {
            inner,
            headers: self.headers.clone(),
        }
    }
}

#[derive(Clone)]
pub struct SecurityHeadersMiddleware<S> {
    inner: S,
    headers: Arc<[(HeaderName, HeaderValue)]>,
}

impl<S> Service<Request<Body>> for SecurityHeadersMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let headers = self.headers.clone();

        Box::pin(async move {
            let mut response = inner.call(request).await?;
            let response_headers = response.headers_mut();
            for (name, value) in headers.iter() {
                response_headers.insert(name.clone(), value.clone());
            }
            Ok(response)
        })
    }
}
