use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::GeminiModel;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("API key rejected: {0}")]
    Unauthorized(String),

    #[error("Request rejected: {0}")]
    BadRequest(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Service overloaded: {0}")]
    Overloaded(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl LlmError {
    /// Classify a failed call from its HTTP status and error message.
    pub fn classify(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        let key_problem = lower.contains("api key")
            || lower.contains("permission denied")
            || lower.contains("unauthorized");

        match status {
            401 | 403 => LlmError::Unauthorized(message),
            _ if key_problem => LlmError::Unauthorized(message),
            400 => LlmError::BadRequest(message),
            429 => LlmError::RateLimited(message),
            500 | 503 => LlmError::Overloaded(message),
            _ => LlmError::Api { status, message },
        }
    }

    /// The provider's message without the variant prefix.
    pub fn into_message(self) -> String {
        match self {
            LlmError::Unauthorized(msg)
            | LlmError::BadRequest(msg)
            | LlmError::RateLimited(msg)
            | LlmError::Overloaded(msg)
            | LlmError::Network(msg)
            | LlmError::InvalidResponse(msg)
            | LlmError::Api { message: msg, .. } => msg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// A single content-generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: GeminiModel,
    pub system_instruction: Option<String>,
    pub turns: Vec<ChatTurn>,
    /// When set, the model must answer with JSON matching this schema.
    pub response_schema: Option<serde_json::Value>,
}

impl GenerateRequest {
    pub fn text(model: GeminiModel, prompt: impl Into<String>) -> Self {
        Self {
            model,
            system_instruction: None,
            turns: vec![ChatTurn::user(prompt)],
            response_schema: None,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run the request and return the concatenated text of the first candidate.
    async fn generate(&self, api_key: &str, request: GenerateRequest) -> Result<String, LlmError>;

    /// Check that the key is accepted by the provider.
    async fn verify_api_key(&self, api_key: &str) -> Result<(), LlmError>;
}
