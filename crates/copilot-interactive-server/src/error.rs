//! Error types for the HTTP layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use copilot_interactive_core::ConfigError;
use serde_json::json;
use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    /// The listening socket could not be opened.
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The request could not be decoded. Carries the status the extractor chose.
    #[error("Invalid request: {message}")]
    InvalidRequest { status: u16, message: String },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn invalid_request(status: StatusCode, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            status: status.as_u16(),
            message: message.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::InvalidRequest { status, .. } => *status,
            ServerError::Bind { .. } | ServerError::Config(_) | ServerError::Internal(_) => 500,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::Bind { .. } => "bind_error",
            ServerError::Config(_) => "config_error",
            ServerError::InvalidRequest { .. } => "invalid_request",
            ServerError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "error": self.to_string(),
            "type": self.error_type(),
        }));
        (status, body).into_response()
    }
}
