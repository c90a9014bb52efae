//! Request and response shapes exchanged with callers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal returned when neither the operator nor the assistant produced input.
pub const NO_RESPONSE_PROVIDED: &str = "no response provided";

/// A caller's request for operator input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRequest {
    /// Why input is needed. Shown in the notification and fed to the assistant.
    #[serde(default)]
    pub context: String,
}

impl InputRequest {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
        }
    }
}

/// Where an [`InputResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    User,
    Assistant,
    Default,
}

impl InputSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputSource::User => "user",
            InputSource::Assistant => "assistant",
            InputSource::Default => "default",
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputResult {
    pub input: String,
    pub source: InputSource,
}

impl InputResult {
    pub fn user(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            source: InputSource::User,
        }
    }

    pub fn assistant(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            source: InputSource::Assistant,
        }
    }

    pub fn no_response() -> Self {
        Self {
            input: NO_RESPONSE_PROVIDED.to_string(),
            source: InputSource::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default = "default_health_status")]
    pub status: String,
    pub version: String,
}

fn default_health_status() -> String {
    "healthy".to_string()
}

impl HealthStatus {
    pub fn healthy(version: impl Into<String>) -> Self {
        Self {
            status: default_health_status(),
            version: version.into(),
        }
    }
}
