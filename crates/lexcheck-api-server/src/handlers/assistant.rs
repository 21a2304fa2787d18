use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::Credentials;
use crate::models::{
    ChatMessageRequest, ChatMessageResponse, StartSessionRequest, StartSessionResponse,
};
use crate::state::AppState;
use crate::utils::error::ApiError;

/// Open a chat about a stored analysis.
pub async fn start_session(
    State(state): State<AppState>,
    Json(request): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<StartSessionResponse>), ApiError> {
    let entry = state.history.get(&request.history_id).await?;
    let session_id = state.assistant.start(&entry.result);
    Ok((StatusCode::CREATED, Json(StartSessionResponse { session_id })))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    credentials: Credentials,
    Json(request): Json<ChatMessageRequest>,
) -> Result<Json<ChatMessageResponse>, ApiError> {
    let reply = state
        .assistant
        .send(&id, &request.message, credentials.api_key()?)
        .await?;
    Ok(Json(ChatMessageResponse { reply }))
}
