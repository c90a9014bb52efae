//! The input-acquisition flow.
//!
//! [`InputService`] alerts the operator, waits for them at the terminal, and
//! falls back to the assistant and finally to a fixed default. Collaborators
//! sit behind small traits so the flow can be exercised without a terminal, a
//! notification tool or an assistant; each of them reports failure as a plain
//! `false`/`None`, which is why the flow itself cannot fail.

use crate::assistant::AssistantClient;
use crate::config::Settings;
use crate::models::InputResult;
use crate::notification::NotificationDispatcher;
use crate::terminal::TerminalReader;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Alerts the operator that input is wanted.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, context: Option<&str>) -> bool;
}

/// Reads an operator answer within a deadline.
#[async_trait]
pub trait TerminalInput: Send + Sync {
    async fn read_with_timeout(&self, timeout: Duration) -> (String, bool);
}

/// Proposes an answer on the operator's behalf.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn suggest(&self, context: &str) -> Option<String>;
}

pub struct InputService {
    notifier: Arc<dyn Notifier>,
    terminal: Arc<dyn TerminalInput>,
    assistant: Arc<dyn SuggestionSource>,
    input_timeout: Duration,
}

impl InputService {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        terminal: Arc<dyn TerminalInput>,
        assistant: Arc<dyn SuggestionSource>,
        input_timeout: Duration,
    ) -> Self {
        Self {
            notifier,
            terminal,
            assistant,
            input_timeout,
        }
    }

    /// Wire the production collaborators. The terminal reader is passed in
    /// because there must be only one per process.
    pub fn from_settings(settings: &Settings, terminal: Arc<TerminalReader>) -> Self {
        Self::new(
            Arc::new(NotificationDispatcher::new(settings)),
            terminal,
            Arc::new(AssistantClient::new(settings)),
            settings.input_timeout(),
        )
    }

    pub async fn get_user_input(&self, context: &str) -> InputResult {
        let notified = self
            .notifier
            .notify(Some(context).filter(|c| !c.is_empty()))
            .await;
        log::info!("Input requested (notification sent: {})", notified);

        let (text, success) = self.terminal.read_with_timeout(self.input_timeout).await;
        if success && !text.is_empty() {
            log::info!("Received input from the terminal");
            return InputResult::user(text);
        }

        if !context.is_empty() {
            if let Some(suggestion) = self.assistant.suggest(context).await {
                log::info!("Using assistant suggestion");
                return InputResult::assistant(suggestion);
            }
        }

        log::info!("No input available, returning default response");
        InputResult::no_response()
    }
}
