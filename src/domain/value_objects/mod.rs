//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! - **ProfileRole / Actor**: who is calling and with which platform role
//! - **TimeRange**: half-open UTC interval used for bookings and opening hours

mod role;
mod time_range;

pub use role::*;
pub use time_range::*;
