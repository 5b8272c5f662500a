use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::AssistantConfig;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Assistant request failed: {0}")]
    Transport(String),

    #[error("Assistant returned {0}")]
    Status(String),

    #[error("Assistant returned an empty reply")]
    EmptyReply,
}

/// Produces an assistant reply for a user message
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_message: &str) -> Result<String, AssistantError>;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone)]
pub struct HttpTextGenerator {
    client: Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpTextGenerator {
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            client: Client::new(),
            url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

fn first_reply(response: CompletionResponse) -> Result<String, AssistantError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(AssistantError::EmptyReply)
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, system_prompt: &str, user_message: &str) -> Result<String, AssistantError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_message },
            ],
        });

        debug!("Requesting assistant reply from {}", self.url);
        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AssistantError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            error!("Assistant endpoint returned {}", status);
            return Err(AssistantError::Status(status.to_string()));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Transport(e.to_string()))?;
        first_reply(parsed)
    }
}
