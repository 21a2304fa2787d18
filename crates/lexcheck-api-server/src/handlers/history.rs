use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::SearchHistoryItem;
use crate::services::HistoryStore;
use crate::utils::error::ApiError;

pub async fn list_history(State(history): State<Arc<HistoryStore>>) -> Json<Vec<SearchHistoryItem>> {
    Json(history.list().await)
}

pub async fn get_history(
    State(history): State<Arc<HistoryStore>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SearchHistoryItem>, ApiError> {
    Ok(Json(history.get(&id).await?))
}

pub async fn clear_history(
    State(history): State<Arc<HistoryStore>>,
) -> Result<StatusCode, ApiError> {
    history.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}
