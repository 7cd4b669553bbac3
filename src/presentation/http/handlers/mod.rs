//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints. Each module builds its
//! application service from the shared pool per request.

pub mod appointment;
pub mod approval;
pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod health;
pub mod invite;
pub mod profile;
pub mod salon;
pub mod staff;
pub mod ticket;
