//! Human-in-the-loop input acquisition.
//!
//! A caller asks for input; the operator at the terminal is alerted, prompted
//! and given a bounded amount of time to answer. When nobody answers, a local
//! OpenAI-compatible assistant may suggest an answer instead, and failing that a
//! fixed default is returned. Every request resolves with an [`InputResult`].
//!
//! - [`config`]: settings from the environment and `.env` files
//! - [`terminal`]: serialized, time-bounded terminal reads
//! - [`notification`]: best-effort operator alerts
//! - [`assistant`]: the fallback suggestion client
//! - [`input`]: the orchestration of all three

pub mod assistant;
pub mod config;
pub mod errors;
pub mod input;
pub mod models;
pub mod notification;
pub mod platform;
pub mod terminal;
pub mod text;

pub use assistant::AssistantClient;
pub use config::Settings;
pub use errors::{AssistantError, ConfigError, NotificationError};
pub use input::{InputService, Notifier, SuggestionSource, TerminalInput};
pub use models::{HealthStatus, InputRequest, InputResult, InputSource, NO_RESPONSE_PROVIDED};
pub use notification::NotificationDispatcher;
pub use terminal::TerminalReader;
