//! `DomainError` → HTTP response.
//!
//! Body shape is always `{"error": "<code>", "message": "<text>"}`.
//! Internal and upstream details are logged, never returned.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::{DomainError, GatewayError};
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        Self(DomainError::Gateway(e))
    }
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self(DomainError::Validation(message.into()))
    }

    fn parts(&self) -> (StatusCode, &'static str, String) {
        match &self.0 {
            DomainError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.clone()),
            // Duplicate usernames have always been answered with 400.
            DomainError::Conflict(m) => (StatusCode::BAD_REQUEST, "conflict", m.clone()),
            DomainError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.clone()),
            DomainError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.clone()),
            DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found", self.0.to_string()),
            DomainError::Gateway(GatewayError::NotConfigured) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "gateway_error", GatewayError::NotConfigured.to_string())
            }
            DomainError::Gateway(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "gateway_error", "language model request failed".into())
            }
            DomainError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal server error".into())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        match &self.0 {
            DomainError::Internal(detail) => error!(%detail, "request failed"),
            DomainError::Gateway(e) => warn!(error = %e, "language model failure surfaced to client"),
            _ => {}
        }

        let mut response = (status, Json(json!({ "error": code, "message": message }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(e: DomainError) -> StatusCode {
        ApiError(e).into_response().status()
    }

    #[test]
    fn status_mapping() {
        assert_eq!(status_of(DomainError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(DomainError::Conflict("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(DomainError::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_of(DomainError::not_found("discussion", 1)), StatusCode::NOT_FOUND);
        assert_eq!(status_of(GatewayError::NotConfigured.into()), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unauthorized_carries_challenge() {
        let response = ApiError(DomainError::Unauthorized("nope".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[test]
    fn internal_details_are_redacted() {
        let (_, code, message) = ApiError(DomainError::Internal("password=hunter2".into())).parts();
        assert_eq!(code, "internal_error");
        assert!(!message.contains("hunter2"));

        let upstream = GatewayError::Status { status: 401, message: "invalid key sk-or-123".into() };
        let (_, _, message) = ApiError::from(upstream).parts();
        insta::assert_snapshot!(message, @"language model request failed");
    }
}
