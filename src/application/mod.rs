//! Application Layer
//!
//! One service per area of the marketplace (auth, salons, catalog, staff,
//! invites, appointments, tickets, approvals, dashboards). Services apply
//! access rules, call the repositories and return domain entities; the
//! DTOs translate between those entities and the JSON API.

pub mod dto;
pub mod services;
