//! Error types for the input-acquisition flow.
//!
//! None of these ever reach the HTTP caller. Each collaborator converts its own
//! errors into a "no value" outcome at its boundary; the enums exist so that the
//! boundary can pick the right log level and message.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    #[error("Invalid bind address '{addr}': {reason}")]
    InvalidBindAddress { addr: String, reason: String },
}

impl ConfigError {
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failures of a single notification attempt. Always advisory.
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification tool not available: {0}")]
    ToolNotFound(String),
    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Failures of the assistant fallback call.
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Assistant request timed out")]
    Timeout,
    #[error("Assistant request failed: {0}")]
    Request(String),
    #[error("Assistant returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Unexpected assistant error: {0}")]
    Unexpected(String),
}

impl AssistantError {
    /// Timeouts, refused connections and bad statuses are expected when the
    /// local assistant is not running; everything else is a bug worth an error log.
    pub fn is_expected(&self) -> bool {
        !matches!(self, AssistantError::Unexpected(_))
    }
}

impl From<reqwest::Error> for AssistantError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AssistantError::Timeout
        } else if err.is_connect() || err.is_request() || err.is_body() {
            AssistantError::Request(err.to_string())
        } else {
            AssistantError::Unexpected(err.to_string())
        }
    }
}
