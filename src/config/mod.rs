//! # Configuration Module
//!
//! This module handles application configuration loading and management.
//! Configuration can be loaded from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{environment}.toml)
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use salon_booking::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Slots are {} minutes wide", settings.booking.slot_interval_minutes);
//! ```

mod settings;

pub use settings::*;
