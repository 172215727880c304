//! Advisory language-model interface and the prompt sent for each signal.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Failed to serialize advisory payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub id: String,
    /// Unix timestamp (seconds) at which the completion was created
    pub created: i64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// Message as returned by the model. `content` is null for refusals and tool
/// calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub role: ChatRole,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    pub message: CompletionMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl ChatCompletion {
    /// Generated text of the first choice
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

#[async_trait]
pub trait AdvisoryService: Send + Sync {
    async fn chat_completion(&self, messages: &[ChatMessage])
        -> Result<ChatCompletion, AdvisoryError>;
}

/// Conversation submitted for a payload: the serialized payload three times,
/// as user, assistant, user.
pub fn advisory_messages<T: Serialize + ?Sized>(
    payload: &T,
) -> Result<Vec<ChatMessage>, AdvisoryError> {
    let content = serde_json::to_string(payload)?;
    Ok(vec![
        ChatMessage::new(ChatRole::User, content.clone()),
        ChatMessage::new(ChatRole::Assistant, content.clone()),
        ChatMessage::new(ChatRole::User, content),
    ])
}

/// Consult the advisory service about a payload.
///
/// Returns the completion's `created` timestamp as text, not the generated
/// content. Callers treat the value as informational only.
pub async fn request_advice<T: Serialize + Sync + ?Sized>(
    advisor: &dyn AdvisoryService,
    payload: &T,
) -> Result<String, AdvisoryError> {
    let messages = advisory_messages(payload)?;
    let completion = advisor.chat_completion(&messages).await?;

    let advice = completion.created.to_string();
    info!(advice = %advice, model = %completion.model, "Advisory response received");
    debug!(text = ?completion.text(), "Advisory generated text");

    Ok(advice)
}
