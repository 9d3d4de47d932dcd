//! Authentication and token handling for SynerHarvest
//!
//! This crate provides:
//! - JWT creation and validation for API authentication
//! - Password hashing and verification (Argon2id)

pub mod jwt;
pub mod password;

pub use jwt::{JwtClaims, JwtError, JwtValidator};
pub use password::{hash_password, verify_password, PasswordError};
