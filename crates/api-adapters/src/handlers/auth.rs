use axum::extract::State;
use axum::Json;
use domains::{AccessToken, User};

use crate::dto::RegisterRequest;
use crate::error::ApiError;
use crate::extract::{ApiJson, AuthUser, LoginForm};
use crate::state::AppState;

/// POST /register
pub(crate) async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<Json<AccessToken>, ApiError> {
    let token = state.auth.register(&req.username, &req.password, req.full_name).await?;
    Ok(Json(token))
}

/// POST /token
pub(crate) async fn login(
    State(state): State<AppState>,
    LoginForm(req): LoginForm,
) -> Result<Json<AccessToken>, ApiError> {
    Ok(Json(state.auth.login(&req.username, &req.password).await?))
}

/// GET /users/me
pub(crate) async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}
