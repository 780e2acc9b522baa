//! Request extractors: bearer authentication and bodies whose rejections use
//! the standard error envelope.

use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::{Form, Json};
use domains::{DomainError, User};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::dto::LoginRequest;
use crate::error::ApiError;
use crate::state::AppState;

/// The caller, resolved from `Authorization: Bearer <token>`. Rejects with 401.
pub struct AuthUser(pub User);

/// The caller if a valid bearer token was sent, otherwise `None`.
pub struct MaybeAuthUser(pub Option<User>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| DomainError::Unauthorized("Not authenticated".into()))?;
        Ok(Self(state.auth.authenticate(token).await?))
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(state.auth.authenticate_optional(bearer_token(parts)).await?))
    }
}

/// `axum::Json` with malformed bodies reported as 400 validation errors.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Login credentials from either a JSON body or an urlencoded form.
pub struct LoginForm(pub LoginRequest);

impl<S> FromRequest<S> for LoginForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(login) = Form::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
            Ok(Self(login))
        } else {
            let ApiJson(login) = ApiJson::<LoginRequest>::from_request(req, state).await?;
            Ok(Self(login))
        }
    }
}

/// Path ids that do not parse cannot name an existing row.
pub fn parse_id(raw: &str, entity: &'static str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| DomainError::not_found(entity, raw).into())
}
