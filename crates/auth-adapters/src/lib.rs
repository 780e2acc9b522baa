//! # auth-adapters
//!
//! Password hashing and bearer-token adapters for the `domains` auth ports.

pub mod password;
#[cfg(feature = "auth-jwt")]
pub mod jwt;

pub use password::Argon2Hasher;
#[cfg(feature = "auth-jwt")]
pub use jwt::JwtTokenService;
