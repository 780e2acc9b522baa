use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{Discussion, DiscussionQuery, DomainError};
use services::DiscussionDetail;

use crate::dto::{CreateDiscussionRequest, ListParams, Paginated, UpdateDiscussionRequest};
use crate::error::ApiError;
use crate::extract::{parse_id, ApiJson, AuthUser};
use crate::state::AppState;

/// GET /discussions
pub(crate) async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<Discussion>>, ApiError> {
    let query = DiscussionQuery {
        owner: None,
        search: params.search(),
        ordering: params.ordering()?,
        page: params.page_request()?,
    };
    let page = state.discussions.list(user.requester(), query).await?;
    Ok(Json(Paginated::try_from(page)?))
}

/// POST /discussions
pub(crate) async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateDiscussionRequest>,
) -> Result<(StatusCode, Json<Discussion>), ApiError> {
    let discussion = state.discussions.create(user.requester(), req.title).await?;
    Ok((StatusCode::CREATED, Json(discussion)))
}

/// GET /discussions/{id}
pub(crate) async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DiscussionDetail>, ApiError> {
    let id = parse_id(&id, "discussion")?;
    Ok(Json(state.discussions.get(user.requester(), id).await?))
}

/// PATCH /discussions/{id}. A missing `title` key leaves the discussion untouched.
pub(crate) async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateDiscussionRequest>,
) -> Result<Json<Discussion>, ApiError> {
    let id = parse_id(&id, "discussion")?;
    let discussion = match req.title {
        Some(title) => state.discussions.rename(user.requester(), id, title).await?,
        None => state.discussions.get(user.requester(), id).await?.discussion,
    };
    Ok(Json(discussion))
}

/// DELETE /discussions/{id}
pub(crate) async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "discussion")?;
    state.discussions.delete(user.requester(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /discussions/{id}/generate-title. 400 when there is nothing to title it after.
pub(crate) async fn generate_title(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Discussion>, ApiError> {
    let id = parse_id(&id, "discussion")?;
    let discussion = state.discussions.generate_title(user.requester(), id).await.map_err(|e| match e {
        DomainError::NotFound { entity: "analysis", .. } => {
            DomainError::Validation("No analyses found to generate title from".into())
        }
        other => other,
    })?;
    Ok(Json(discussion))
}
