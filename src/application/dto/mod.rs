//! Data Transfer Objects
//!
//! Request bodies are validated with `validator` and parse string ids into
//! snowflakes; responses render ids as strings.

pub mod request;
pub mod response;
