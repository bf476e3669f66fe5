//! HTTP error mapping

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rxsentry_engine::EngineError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Pipeline or dose calculator failure
    Engine(EngineError),
    /// Body was not valid JSON for the endpoint
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Engine(EngineError::InvalidInput(_)) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Engine(EngineError::UnknownDrug(_)) => StatusCode::NOT_FOUND,
            AppError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Engine(e) => e.kind(),
            AppError::BadRequest(_) => "invalid_input",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Engine(e) => e.to_string(),
            AppError::BadRequest(msg) => msg.clone(),
        };

        if status.is_server_error() {
            warn!(kind = self.kind(), "Request failed: {}", message);
        }

        let body = Json(ErrorResponse {
            error: message,
            kind: self.kind().to_string(),
        });

        (status, body).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::Engine(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
