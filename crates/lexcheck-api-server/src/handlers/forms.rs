use axum::{extract::State, Json};

use super::Credentials;
use crate::models::{FormGuideRequest, FormGuideResponse};
use crate::state::AppState;
use crate::utils::error::ApiError;

pub async fn form_guide_handler(
    State(state): State<AppState>,
    credentials: Credentials,
    Json(request): Json<FormGuideRequest>,
) -> Result<Json<FormGuideResponse>, ApiError> {
    let (api_key, model) = credentials.resolve(request.model)?;
    let guide = state.form_guide.guide(&request, model, api_key).await?;
    Ok(Json(FormGuideResponse { guide }))
}
