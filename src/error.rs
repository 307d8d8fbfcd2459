use std::process::ExitStatus;
use std::time::Duration;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// A request body that failed validation. The first violated constraint wins.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Request body must be valid JSON: {0}")]
    InvalidBody(String),

    #[error("Request body is required")]
    MissingBody,

    #[error("Text field is required and cannot be empty")]
    MissingText,

    #[error("Text length exceeds maximum of {max} characters")]
    TextTooLong { max: usize },

    #[error("Invalid voice. Allowed voices: {allowed}")]
    InvalidVoice { allowed: String },

    #[error("Only WAV format is supported. Please omit the format parameter or use 'wav'.")]
    UnsupportedFormat,
}

/// The external synthesis tool did not produce usable audio.
#[derive(thiserror::Error, Debug)]
pub enum SynthesisError {
    #[error("Failed to run synthesis command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Synthesis command exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("Synthesis command timed out after {0:?}")]
    Timeout(Duration),

    #[error("Output file was not created: {0}")]
    MissingOutput(String),

    #[error("Output file is empty: {0}")]
    EmptyOutput(String),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("Default voice '{0}' is not in the allowed voices")]
    DefaultVoiceNotAllowed(String),
}

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("TTS synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(ValidationError::InvalidBody(rejection.body_text()))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", e.to_string()),
            AppError::Synthesis(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "TTS_ERROR",
                "TTS synthesis failed: failed to generate audio file".to_string(),
            ),
            AppError::Internal(_) | AppError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An unexpected error occurred".to_string(),
            ),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "The requested endpoint does not exist".to_string(),
            ),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "METHOD_NOT_ALLOWED",
                "The HTTP method is not allowed for this endpoint".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {} - {}", code, self);
        } else {
            tracing::warn!("Request rejected: {} - {}", code, message);
        }

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}
