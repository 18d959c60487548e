//! Text generation providers and the fallthrough chain that tries them.

pub mod gemini;
pub mod local;
pub mod openai;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

use agentdesk_core::config::{resolve_api_key, LlmSettings, ProviderSettings};
use agentdesk_core::{Error, Result};

pub use gemini::GeminiProvider;
pub use local::LocalT5Provider;
pub use openai::OpenAiProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("model failure: {0}")]
    Model(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout(Duration::ZERO)
        } else if e.is_decode() {
            ProviderError::Malformed(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

/// Map a non-success HTTP status to a provider failure.
pub(crate) fn status_error(status: reqwest::StatusCode, body: &str) -> ProviderError {
    let snippet: String = body.chars().take(200).collect();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        ProviderError::Auth(format!("HTTP {status}: {snippet}"))
    } else {
        ProviderError::Transport(format!("HTTP {status}: {snippet}"))
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, prompt: &str, max_tokens: usize) -> std::result::Result<String, ProviderError>;
}

/// Output of a successful chain call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub provider: String,
}

/// Providers tried in order, each bounded by `timeout`.
pub struct ProviderChain {
    providers: Vec<Box<dyn LlmProvider>>,
    timeout: Duration,
}

impl ProviderChain {
    pub fn new(providers: Vec<Box<dyn LlmProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// First successful non-empty completion. Exhausting the chain yields
    /// `Error::LlmUnavailable` listing every attempt.
    pub async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<Generation> {
        let mut attempts = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let outcome = match timeout(self.timeout, provider.send(prompt, max_tokens)).await {
                Ok(Ok(text)) if text.trim().is_empty() => Err(ProviderError::Malformed("empty completion".to_string())),
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(self.timeout)),
            };
            match outcome {
                Ok(text) => {
                    info!(provider = provider.name(), "LLM call succeeded");
                    return Ok(Generation { text: text.trim().to_string(), provider: provider.name().to_string() });
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "LLM provider failed; trying next");
                    attempts.push(format!("{}: {}", provider.name(), e));
                }
            }
        }
        Err(Error::LlmUnavailable { attempts })
    }
}

/// Build the chain from settings. A local model that fails to load is left
/// out; hosted providers are always added and fail at call time if
/// misconfigured.
pub fn build_chain(settings: &LlmSettings) -> ProviderChain {
    let timeout = Duration::from_secs(settings.timeout_secs);
    let mut providers: Vec<Box<dyn LlmProvider>> = Vec::new();
    for entry in &settings.providers {
        match entry {
            ProviderSettings::Local { model_dir, max_input_tokens } => {
                match LocalT5Provider::load(model_dir.as_deref(), *max_input_tokens) {
                    Ok(p) => providers.push(Box::new(p)),
                    Err(e) => warn!(error = %e, "Local generator unavailable; skipping"),
                }
            }
            ProviderSettings::OpenAi { base_url, model, api_key, api_key_env } => {
                let key = resolve_api_key(api_key.as_deref(), api_key_env.as_deref());
                providers.push(Box::new(OpenAiProvider::new(base_url, model, key, timeout)));
            }
            ProviderSettings::Gemini { base_url, model, api_key, api_key_env } => {
                let key = resolve_api_key(api_key.as_deref(), api_key_env.as_deref());
                providers.push(Box::new(GeminiProvider::new(base_url, model, key, timeout)));
            }
        }
    }
    info!(providers = ?providers.iter().map(|p| p.name().to_string()).collect::<Vec<_>>(), "LLM chain ready");
    ProviderChain::new(providers, timeout)
}
