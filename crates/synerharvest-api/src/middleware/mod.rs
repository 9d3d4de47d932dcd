//! API Middleware
//!
//! Middleware components for the SynerHarvest API server.

pub mod auth;

pub use auth::{require_auth, AuthUser, JwtState};
