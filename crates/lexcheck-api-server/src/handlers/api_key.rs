use axum::{extract::State, Json};
use tracing::info;

use super::Credentials;
use crate::models::{
    GeminiModel, ModelOption, ModelsResponse, VerifyApiKeyRequest, VerifyApiKeyResponse,
};
use crate::services::LlmError;
use crate::state::AppState;
use crate::utils::error::ApiError;

/// Check a user-supplied key against the provider.
pub async fn verify_api_key(
    State(state): State<AppState>,
    Json(request): Json<VerifyApiKeyRequest>,
) -> Result<Json<VerifyApiKeyResponse>, ApiError> {
    let key = request.api_key.trim();
    if key.is_empty() {
        return Err(ApiError::BadRequest("api_key must not be empty".to_string()));
    }

    match state.llm.verify_api_key(key).await {
        Ok(()) => {
            info!("User API key verified");
            Ok(Json(VerifyApiKeyResponse { valid: true }))
        }
        Err(LlmError::Network(msg)) => Err(ApiError::LlmError(msg)),
        Err(e) => Err(ApiError::Unauthorized(e.into_message())),
    }
}

/// Models and whether the caller may use them.
pub async fn list_models(credentials: Credentials) -> Json<ModelsResponse> {
    let has_user_key = credentials.has_user_key();
    let default_model = GeminiModel::resolve(None, has_user_key).unwrap_or_default();

    Json(ModelsResponse {
        default_model,
        using_user_api_key: has_user_key,
        models: GeminiModel::ALL
            .iter()
            .map(|model| ModelOption {
                id: *model,
                label: model.label(),
                available: has_user_key || model.allowed_without_user_key(),
            })
            .collect(),
    })
}
