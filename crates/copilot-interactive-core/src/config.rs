//! Process configuration loaded from the environment.
//!
//! Settings are read once at startup and handed to each component by value or
//! reference. Keys are matched case-insensitively, so `APP_PORT`, `app_port` and
//! `App_Port` are equivalent. A `.env` file in the working directory is honoured,
//! but variables already present in the process environment take precedence.
//! Malformed values never abort startup: they are reported and the default is
//! kept.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_APP_PORT: u16 = 4000;
pub const DEFAULT_APP_HOST: &str = "0.0.0.0";
/// Nine minutes.
pub const DEFAULT_INPUT_TIMEOUT_SECS: u64 = 540;
pub const DEFAULT_ASSISTANT_HOST: &str = "localhost";
pub const DEFAULT_ASSISTANT_PORT: u16 = 4141;
pub const DEFAULT_ASSISTANT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_ASSISTANT_MODEL: &str = "gpt-5-mini";
pub const DEFAULT_NOTIFICATION_MAX_CONTENT_LENGTH: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub app_port: u16,
    pub app_host: String,
    /// Seconds to wait for the operator at the terminal.
    pub input_timeout: u64,
    pub assistant_host: String,
    pub assistant_port: u16,
    /// Seconds to wait for the assistant's completion.
    pub assistant_timeout: u64,
    pub assistant_model: String,
    pub notification_enabled: bool,
    pub notification_max_content_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_port: DEFAULT_APP_PORT,
            app_host: DEFAULT_APP_HOST.to_string(),
            input_timeout: DEFAULT_INPUT_TIMEOUT_SECS,
            assistant_host: DEFAULT_ASSISTANT_HOST.to_string(),
            assistant_port: DEFAULT_ASSISTANT_PORT,
            assistant_timeout: DEFAULT_ASSISTANT_TIMEOUT_SECS,
            assistant_model: DEFAULT_ASSISTANT_MODEL.to_string(),
            notification_enabled: true,
            notification_max_content_length: DEFAULT_NOTIFICATION_MAX_CONTENT_LENGTH,
        }
    }
}

impl Settings {
    /// Load settings from `.env` (if present) and the process environment.
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => log::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => log::warn!("Ignoring unreadable .env file: {}", e),
        }
        Self::from_vars(process_vars())
    }

    /// Like [`Settings::from_env`], but with an explicit dotenv file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let Err(e) = dotenvy::from_path(path) {
            log::warn!("Ignoring env file {}: {}", path.display(), e);
        }
        Self::from_vars(process_vars())
    }

    /// Build settings from an arbitrary set of key/value pairs.
    ///
    /// Unknown keys are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut settings = Self::default();
        for (key, value) in vars {
            if let Err(e) = settings.apply_var(key.as_ref(), value.as_ref()) {
                log::warn!("{}; keeping default", e);
            }
        }
        settings
    }

    /// Apply a single variable. Returns `Ok(false)` when the key is not a setting.
    pub fn apply_var(&mut self, key: &str, value: &str) -> Result<bool, ConfigError> {
        let value = value.trim();
        match key.to_ascii_lowercase().as_str() {
            "app_port" => self.app_port = parse_number(key, value)?,
            "app_host" => self.app_host = value.to_string(),
            "input_timeout" => self.input_timeout = parse_number(key, value)?,
            "assistant_host" => self.assistant_host = value.to_string(),
            "assistant_port" => self.assistant_port = parse_number(key, value)?,
            "assistant_timeout" => self.assistant_timeout = parse_number(key, value)?,
            "assistant_model" => self.assistant_model = value.to_string(),
            "notification_enabled" => self.notification_enabled = parse_bool(key, value)?,
            "notification_max_content_length" => {
                self.notification_max_content_length = parse_number(key, value)?
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub fn with_app_port(mut self, port: u16) -> Self {
        self.app_port = port;
        self
    }

    pub fn with_app_host(mut self, host: impl Into<String>) -> Self {
        self.app_host = host.into();
        self
    }

    pub fn with_input_timeout(mut self, seconds: u64) -> Self {
        self.input_timeout = seconds;
        self
    }

    pub fn with_assistant(mut self, host: impl Into<String>, port: u16) -> Self {
        self.assistant_host = host.into();
        self.assistant_port = port;
        self
    }

    pub fn with_assistant_timeout(mut self, seconds: u64) -> Self {
        self.assistant_timeout = seconds;
        self
    }

    pub fn with_assistant_model(mut self, model: impl Into<String>) -> Self {
        self.assistant_model = model.into();
        self
    }

    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notification_enabled = enabled;
        self
    }

    pub fn with_notification_max_content_length(mut self, length: usize) -> Self {
        self.notification_max_content_length = length;
        self
    }

    pub fn input_timeout(&self) -> Duration {
        Duration::from_secs(self.input_timeout)
    }

    pub fn assistant_timeout(&self) -> Duration {
        Duration::from_secs(self.assistant_timeout)
    }

    pub fn assistant_base_url(&self) -> String {
        format!("http://{}:{}", self.assistant_host, self.assistant_port)
    }

    /// Resolve `app_host:app_port` to a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.app_host, self.app_port);
        let invalid = |reason: String| ConfigError::InvalidBindAddress {
            addr: addr.clone(),
            reason,
        };
        (self.app_host.as_str(), self.app_port)
            .to_socket_addrs()
            .map_err(|e| invalid(e.to_string()))?
            .next()
            .ok_or_else(|| invalid("host did not resolve to any address".to_string()))
    }
}

/// Process environment, skipping entries that are not valid UTF-8.
fn process_vars() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| ConfigError::invalid_value(key, value, e))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        _ => Err(ConfigError::invalid_value(key, value, "expected a boolean")),
    }
}
