use axum::extract::State;
use axum::Json;
use domains::{ChatMessage, QuizQuestion};
use tracing::info;

use crate::dto::{ChatRequest, ChatResponse};
use crate::error::ApiError;
use crate::extract::{ApiJson, MaybeAuthUser};
use crate::state::AppState;

/// POST /chat. Anonymous callers are allowed; a known caller is addressed by name.
pub(crate) async fn chat(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    ApiJson(req): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let history: Vec<ChatMessage> = req.history.into_iter().map(ChatMessage::from).collect();
    let name = user.as_ref().map(|u| u.display_name());
    info!(authenticated = user.is_some(), turns = history.len(), "chat request");

    let text = state.gateway.chat(history, &req.message, name).await?;
    Ok(Json(ChatResponse { text }))
}

/// POST /quiz. Always answers; the gateway substitutes fixed questions on failure.
pub(crate) async fn quiz(State(state): State<AppState>) -> Json<Vec<QuizQuestion>> {
    Json(state.gateway.generate_quiz().await)
}
