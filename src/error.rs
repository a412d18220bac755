use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Failures caught inside the imputation handler.
#[derive(Debug, Error)]
pub enum ImputeError {
    #[error("{0}")]
    ModelInvocation(String),
    #[error("Failed to parse JSON from LLM response: {0}")]
    ResponseParse(String),
    #[error("Model call timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),
    #[error("Failed to render prompt: {0}")]
    PromptRender(String),
}

impl ImputeError {
    pub fn is_parse(&self) -> bool {
        matches!(self, ImputeError::ResponseParse(_))
    }
}

/// Failures reported to the caller as a non-200 status with `{"detail": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadGateway(String),
    #[error("{0}")]
    GatewayTimeout(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ImputeError> for ApiError {
    fn from(err: ImputeError) -> Self {
        match err {
            ImputeError::Timeout(_) => ApiError::GatewayTimeout(err.to_string()),
            ImputeError::PromptRender(_) => ApiError::Internal(err.to_string()),
            _ => ApiError::BadGateway(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
