//! # API Shared
//!
//! Shared utilities and definitions for the triage APIs.
//!
//! Contains:
//! - Wire request/response types with OpenAPI schemas (`dto` module)
//! - Shared services like `HealthService`
//! - Authentication utilities: API-key check and caller identity headers
//!
//! Used by `api-rest`.

pub mod auth;
pub mod dto;
pub mod health;

pub use health::HealthService;
