//! Fallback suggestions from a local OpenAI-compatible assistant.
//!
//! Used only when the operator did not answer. Exactly one request is made per
//! fallback, with its own timeout, and any failure simply means "no suggestion".

use crate::config::Settings;
use crate::errors::AssistantError;
use crate::input::SuggestionSource;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const SYSTEM_PROMPT: &str = "You are an assistant that must suggest a single-line terminal input \
that best matches the user intent given the context. \
Respond only with the suggested input, no explanation.";

pub const DEFAULT_MAX_TOKENS: u32 = 256;

fn user_prompt(context: &str) -> String {
    format!(
        "Context: {}\n\n\
         Please provide a single-line input string (as the user would type) \
         that should be returned automatically because the user did not respond. \
         Do not wrap the suggestion in quotes.",
        context
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Body of `POST /chat/completions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

#[derive(Debug, Clone)]
pub struct AssistantClient {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl AssistantClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.assistant_base_url(),
            model: settings.assistant_model.clone(),
            timeout: settings.assistant_timeout(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub fn build_request(&self, context: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::new(ChatRole::System, SYSTEM_PROMPT),
                ChatMessage::new(ChatRole::User, user_prompt(context)),
            ],
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Ask the assistant what the operator would probably have typed.
    ///
    /// Returns `None` without any request when `context` is empty, and on every
    /// kind of failure.
    pub async fn suggest(&self, context: &str) -> Option<String> {
        if context.is_empty() {
            return None;
        }

        match self.request_suggestion(context).await {
            Ok(suggestion) => {
                if suggestion.is_none() {
                    log::info!("Assistant response contained no usable suggestion");
                }
                suggestion
            }
            Err(e) if e.is_expected() => {
                log::warn!("{}", e);
                None
            }
            Err(e) => {
                log::error!("{}", e);
                None
            }
        }
    }

    async fn request_suggestion(&self, context: &str) -> Result<Option<String>, AssistantError> {
        let url = self.endpoint();
        let body = self.build_request(context);
        log::debug!("Requesting assistant suggestion from {}", url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if status != StatusCode::OK {
            return Err(AssistantError::Status {
                status: status.as_u16(),
                body: response_text,
            });
        }

        log::debug!("Assistant response: {}", response_text);
        Ok(parse_response(&response_text))
    }
}

#[async_trait]
impl SuggestionSource for AssistantClient {
    async fn suggest(&self, context: &str) -> Option<String> {
        AssistantClient::suggest(self, context).await
    }
}

/// Extract a suggestion from a raw response body.
///
/// Tries a chat-completion object, then a bare JSON string, and treats a body
/// that is not JSON at all as the suggestion itself. Blank results are `None`.
pub fn parse_response(response_text: &str) -> Option<String> {
    match serde_json::from_str::<Value>(response_text) {
        Ok(value) => extract_suggestion(&value),
        Err(_) => non_blank(response_text),
    }
}

fn extract_suggestion(value: &Value) -> Option<String> {
    match value {
        Value::Object(body) => body
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .and_then(non_blank),
        Value::String(text) => non_blank(text),
        _ => None,
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
