//! Shared Utilities
//!
//! Error type, id generation and request validation used by every layer.

pub mod error;
pub mod snowflake;
pub mod validation;
