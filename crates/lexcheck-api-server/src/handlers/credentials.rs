use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

use crate::models::GeminiModel;
use crate::state::AppState;
use crate::utils::error::ApiError;

/// Header carrying the caller's own Gemini key.
pub const USER_API_KEY_HEADER: &str = "x-gemini-api-key";

/// Gemini credentials available to a request.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    user_key: Option<String>,
    fallback_key: Option<String>,
}

impl Credentials {
    pub fn new(user_key: Option<String>, fallback_key: Option<String>) -> Self {
        let non_blank = |key: Option<String>| key.filter(|k| !k.trim().is_empty());
        Self {
            user_key: non_blank(user_key),
            fallback_key: non_blank(fallback_key),
        }
    }

    pub fn has_user_key(&self) -> bool {
        self.user_key.is_some()
    }

    /// The user key, else the server key.
    pub fn api_key(&self) -> Result<&str, ApiError> {
        self.user_key
            .as_deref()
            .or(self.fallback_key.as_deref())
            .ok_or_else(|| {
                ApiError::Unauthorized(
                    "No Gemini API key configured; supply one in the x-gemini-api-key header"
                        .to_string(),
                )
            })
    }

    /// Key and model for a request, applying the model policy.
    pub fn resolve(&self, requested: Option<GeminiModel>) -> Result<(&str, GeminiModel), ApiError> {
        let model = GeminiModel::resolve(requested, self.has_user_key())?;
        Ok((self.api_key()?, model))
    }
}

impl FromRequestParts<AppState> for Credentials {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_key = parts
            .headers
            .get(USER_API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string());

        Ok(Credentials::new(user_key, state.settings.gemini.api_key.clone()))
    }
}
