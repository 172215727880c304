//! OpenAI chat completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::OpenAiConfig;
use crate::services::advisory::{AdvisoryError, AdvisoryService, ChatCompletion, ChatMessage};

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig) -> Self {
        Self::with_client(&config.base_url, &config.api_key, &config.model, Client::new())
    }

    pub fn with_client(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl AdvisoryService for OpenAiClient {
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
    ) -> Result<ChatCompletion, AdvisoryError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, messages = messages.len(), "Requesting chat completion");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest {
                model: &self.model,
                messages,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await?;
            error!(status = status.as_u16(), body = %text, "Chat completion failed");
            let message = match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => envelope.error.message,
                Err(_) if text.trim().is_empty() => status.to_string(),
                Err(_) => text,
            };
            return Err(AdvisoryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json::<ChatCompletion>().await?)
    }
}
