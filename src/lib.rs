//! # Salon Booking Library
//!
//! JSON HTTP API for a salon booking marketplace: customers book
//! appointments, salon owners run their back office, staff work their
//! schedule and platform admins moderate listings and support tickets.
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Entities, repository traits, access and scheduling rules
//! - **Application Layer**: Use-case services and DTOs
//! - **Infrastructure Layer**: PostgreSQL repositories, Redis cache, metrics
//! - **Presentation Layer**: axum router, handlers and middleware
//!
//! ## Module Structure
//!
//! ```text
//! salon_booking/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects and domain services
//! +-- application/    Application services and DTOs
//! +-- infrastructure/ Database, cache and metrics
//! +-- presentation/   HTTP routes and middleware
//! +-- shared/         Errors, snowflake IDs, validation helpers
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP handlers and middleware
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
