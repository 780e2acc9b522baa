//! # DomainError
//!
//! Centralized error handling for TruthBot.
//! Maps domain-specific failures to actionable error types; the HTTP layer
//! decides status codes.

use thiserror::Error;

/// Failure talking to the external language-model provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// No API key configured
    #[error("language model API key is not configured")]
    NotConfigured,

    /// Connection refused, DNS, timeout
    #[error("transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-2xx status
    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// 2xx answer whose envelope could not be read (no choices, empty content)
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// The primary error type for all domain operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Resource not found (e.g., Discussion, Analysis)
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: &'static str, id: String },

    /// Rejected input (e.g., empty content, unknown ordering key)
    #[error("validation error: {0}")]
    Validation(String),

    /// Bad credentials, invalid or expired token
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not the owner and not an admin
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource already exists (e.g., duplicate username)
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound { entity, id: id.to_string() }
    }
}

/// A specialized Result type for TruthBot logic.
pub type Result<T> = std::result::Result<T, DomainError>;
