use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{status_error, LlmProvider, ProviderError};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Extract `choices[0].message.content` from a chat-completions body.
pub fn parse_chat_completion(body: &str) -> Result<String, ProviderError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| ProviderError::Malformed("no choices[0].message.content".to_string()))
}

/// OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiProvider {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { client, base_url: base_url.trim_end_matches('/').to_string(), model: model.to_string(), api_key }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn send(&self, prompt: &str, max_tokens: usize) -> Result<String, ProviderError> {
        let key = self.api_key.as_deref().ok_or_else(|| ProviderError::Auth("no API key configured".to_string()))?;
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest { model: &self.model, messages: vec![ChatMessage { role: "user", content: prompt }], max_tokens };
        debug!(url = %url, model = %self.model, "Calling chat completions");
        let resp = self.client.post(&url).bearer_auth(key).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(status_error(status, &text));
        }
        parse_chat_completion(&text)
    }
}
