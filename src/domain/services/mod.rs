//! # Domain Services
//!
//! Domain services encapsulate business logic that doesn't naturally
//! belong to a single entity. They are pure and operate on domain entities.
//!
//! ## Services
//!
//! - **AccessPolicy**: Who may manage salons and act on appointments
//! - **schedule**: Opening windows, availability and the day calendar grid

mod access_policy;
pub mod schedule;

pub use access_policy::*;
pub use schedule::{BookingRules, GridCell, GridRow, ScheduleViolation};
