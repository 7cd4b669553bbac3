//! Presentation Layer
//!
//! HTTP routes, handlers and tower middleware.

pub mod http;
pub mod middleware;
