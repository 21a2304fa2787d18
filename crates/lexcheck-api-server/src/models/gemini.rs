use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::error::ApiError;

/// Gemini models offered for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GeminiModel {
    #[serde(rename = "gemini-2.5-pro")]
    Pro,
    #[default]
    #[serde(rename = "gemini-2.5-flash")]
    Flash,
}

impl GeminiModel {
    pub const ALL: [GeminiModel; 2] = [GeminiModel::Pro, GeminiModel::Flash];

    pub fn id(&self) -> &'static str {
        match self {
            GeminiModel::Pro => "gemini-2.5-pro",
            GeminiModel::Flash => "gemini-2.5-flash",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GeminiModel::Pro => "Gemini 2.5 Pro",
            GeminiModel::Flash => "Gemini 2.5 Flash",
        }
    }

    /// Whether the model may be used with the server's shared key.
    pub fn allowed_without_user_key(&self) -> bool {
        matches!(self, GeminiModel::Flash)
    }

    /// Pick the model for a request.
    ///
    /// Without a user key only Flash is available. With one, an unspecified
    /// model means Pro.
    pub fn resolve(requested: Option<GeminiModel>, has_user_key: bool) -> Result<Self, ApiError> {
        match (requested, has_user_key) {
            (Some(model), false) if !model.allowed_without_user_key() => {
                Err(ApiError::Forbidden(format!(
                    "{} requires your own Gemini API key",
                    model.label()
                )))
            }
            (Some(model), _) => Ok(model),
            (None, true) => Ok(GeminiModel::Pro),
            (None, false) => Ok(GeminiModel::Flash),
        }
    }
}

impl fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Serialize)]
pub struct ModelOption {
    pub id: GeminiModel,
    pub label: &'static str,
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub default_model: GeminiModel,
    pub using_user_api_key: bool,
    pub models: Vec<ModelOption>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_uses_api_ids() {
        assert_eq!(serde_json::to_string(&GeminiModel::Pro).unwrap(), "\"gemini-2.5-pro\"");
        let model: GeminiModel = serde_json::from_str("\"gemini-2.5-flash\"").unwrap();
        assert_eq!(model, GeminiModel::Flash);
    }

    #[test]
    fn test_pro_requires_user_key() {
        assert!(matches!(
            GeminiModel::resolve(Some(GeminiModel::Pro), false),
            Err(ApiError::Forbidden(_))
        ));
        assert_eq!(
            GeminiModel::resolve(Some(GeminiModel::Pro), true).unwrap(),
            GeminiModel::Pro
        );
    }

    #[test]
    fn test_default_depends_on_user_key() {
        assert_eq!(GeminiModel::resolve(None, true).unwrap(), GeminiModel::Pro);
        assert_eq!(GeminiModel::resolve(None, false).unwrap(), GeminiModel::Flash);
        assert_eq!(
            GeminiModel::resolve(Some(GeminiModel::Flash), true).unwrap(),
            GeminiModel::Flash
        );
    }
}
