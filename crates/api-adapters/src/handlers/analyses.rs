use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{Analysis, AnalysisQuery};

use crate::dto::{CreateAnalysisRequest, ListParams, Paginated, UpdateAnalysisRequest};
use crate::error::ApiError;
use crate::extract::{parse_id, ApiJson, AuthUser};
use crate::state::AppState;

/// GET /discussions/{discussion_id}/analyses
pub(crate) async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(discussion_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<Analysis>>, ApiError> {
    let query = AnalysisQuery {
        discussion_id: parse_id(&discussion_id, "discussion")?,
        search: params.search(),
        ordering: params.ordering()?,
        page: params.page_request()?,
    };
    let page = state.analyses.list(user.requester(), query).await?;
    Ok(Json(Paginated::try_from(page)?))
}

/// POST /discussions/{discussion_id}/analyses. Scores the content before answering.
pub(crate) async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(discussion_id): Path<String>,
    ApiJson(req): ApiJson<CreateAnalysisRequest>,
) -> Result<(StatusCode, Json<Analysis>), ApiError> {
    let discussion_id = parse_id(&discussion_id, "discussion")?;
    let analysis = state
        .analyses
        .create(user.requester(), discussion_id, req.content, req.content_type)
        .await?;
    Ok((StatusCode::CREATED, Json(analysis)))
}

/// GET /discussions/{discussion_id}/analyses/{id}
pub(crate) async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((discussion_id, id)): Path<(String, String)>,
) -> Result<Json<Analysis>, ApiError> {
    let (discussion_id, id) = (parse_id(&discussion_id, "discussion")?, parse_id(&id, "analysis")?);
    Ok(Json(state.analyses.get(user.requester(), discussion_id, id).await?))
}

/// PATCH /discussions/{discussion_id}/analyses/{id}
pub(crate) async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((discussion_id, id)): Path<(String, String)>,
    ApiJson(req): ApiJson<UpdateAnalysisRequest>,
) -> Result<Json<Analysis>, ApiError> {
    let (discussion_id, id) = (parse_id(&discussion_id, "discussion")?, parse_id(&id, "analysis")?);
    Ok(Json(state.analyses.update(user.requester(), discussion_id, id, req.into()).await?))
}

/// DELETE /discussions/{discussion_id}/analyses/{id}
pub(crate) async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((discussion_id, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let (discussion_id, id) = (parse_id(&discussion_id, "discussion")?, parse_id(&id, "analysis")?);
    state.analyses.delete(user.requester(), discussion_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
