use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use super::Credentials;
use crate::models::{AnalyzeRequest, AnalyzeResponse};
use crate::state::AppState;
use crate::utils::error::ApiError;

pub async fn analyze_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    credentials: Credentials,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let workspace = state.workspaces.get(&id)?;
    let (api_key, model) = credentials.resolve(request.model)?;

    let item = state
        .analysis
        .analyze(&workspace, &request.query, model, api_key)
        .await?;

    Ok(Json(AnalyzeResponse::new(item, model)))
}
