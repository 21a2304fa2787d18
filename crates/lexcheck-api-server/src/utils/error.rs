use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lexcheck_core::{CorpusError, ExtractError};
use serde::Serialize;
use thiserror::Error;

use crate::services::llm::LlmError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unprocessable document: {0}")]
    Unprocessable(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized: {}", msg);
                (StatusCode::UNAUTHORIZED, "Unauthorized", msg)
            }
            ApiError::Forbidden(msg) => {
                tracing::warn!("Forbidden: {}", msg);
                (StatusCode::FORBIDDEN, "Forbidden", msg)
            }
            ApiError::NotFound(msg) => {
                tracing::warn!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, "NotFound", msg)
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "BadRequest", msg)
            }
            ApiError::PayloadTooLarge(msg) => {
                tracing::warn!("Payload too large: {}", msg);
                (StatusCode::PAYLOAD_TOO_LARGE, "PayloadTooLarge", msg)
            }
            ApiError::Unprocessable(msg) => {
                tracing::warn!("Unprocessable document: {}", msg);
                (StatusCode::UNPROCESSABLE_ENTITY, "UnprocessableDocument", msg)
            }
            ApiError::TooManyRequests(msg) => {
                tracing::warn!("Too many requests: {}", msg);
                (StatusCode::TOO_MANY_REQUESTS, "TooManyRequests", msg)
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalError", msg)
            }
            ApiError::LlmError(msg) => {
                tracing::error!("LLM error: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "LlmError", msg)
            }
            ApiError::UpstreamError(msg) => {
                tracing::error!("Upstream error: {}", msg);
                (StatusCode::BAD_GATEWAY, "UpstreamError", msg)
            }
            ApiError::Timeout(msg) => {
                tracing::error!("Timeout: {}", msg);
                (StatusCode::GATEWAY_TIMEOUT, "Timeout", msg)
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Unauthorized(msg) => ApiError::Unauthorized(format!(
                "The Gemini API key was rejected; re-enter a key or continue with {} ({})",
                crate::models::GeminiModel::Flash.label(),
                msg
            )),
            LlmError::BadRequest(msg) => ApiError::UpstreamError(format!(
                "The model rejected the request or returned a malformed response: {}",
                msg
            )),
            LlmError::InvalidResponse(msg) => {
                ApiError::UpstreamError(format!("The model response could not be read: {}", msg))
            }
            LlmError::RateLimited(msg) => ApiError::TooManyRequests(msg),
            LlmError::Overloaded(msg) => ApiError::LlmError(format!(
                "The model service is temporarily overloaded, try again later: {}",
                msg
            )),
            other => ApiError::LlmError(other.to_string()),
        }
    }
}

impl From<CorpusError> for ApiError {
    fn from(err: CorpusError) -> Self {
        match err {
            CorpusError::EmptyDocument { name } => ApiError::Unprocessable(format!(
                "No text could be extracted from '{}'. The document may be empty or image-based.",
                name
            )),
            CorpusError::EmptyCorpus => {
                ApiError::Unprocessable("No text could be extracted from any document".to_string())
            }
            CorpusError::Extract { name, source } => match source {
                ExtractError::Decode(msg) => {
                    ApiError::Unprocessable(format!("'{}' could not be decoded: {}", name, msg))
                }
                other => ApiError::InternalError(format!("'{}': {}", name, other)),
            },
        }
    }
}
