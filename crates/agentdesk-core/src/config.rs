//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults, `config.toml`, `config.<env>.toml`
//! and `APP_*` env vars (`__` separates nested keys), then extracts a typed
//! [`Settings`] validated once at startup.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::ChunkingConfig;
use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Ok(Self::load_for_env(&env_name))
    }

    pub fn load_for_env(env_name: &str) -> Self {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Self { figment }
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment: Figment::from(Serialized::defaults(Settings::default())).merge(figment) }
    }

    /// Extract and validate the full settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::Configuration(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub embedding: EmbeddingSettings,
    pub reranker: RerankerSettings,
    pub index: IndexSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub ingest: IngestSettings,
    pub llm: LlmSettings,
    pub router: RouterSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.config().validate()?;
        if self.retrieval.coarse_limit == 0 {
            return Err(Error::Configuration("retrieval.coarse_limit must be at least 1".to_string()));
        }
        if self.ingest.batch_size == 0 {
            return Err(Error::Configuration("ingest.batch_size must be at least 1".to_string()));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::Configuration("llm.timeout_secs must be at least 1".to_string()));
        }
        if self.embedding.dimension == 0 {
            return Err(Error::Configuration("embedding.dimension must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_id: String,
    /// Directory holding `config.json`, `tokenizer.json` and weights.
    pub model_dir: Option<String>,
    pub dimension: usize,
    pub max_len: usize,
    pub use_fake: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_id: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            model_dir: None,
            dimension: 384,
            max_len: 256,
            use_fake: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerSettings {
    pub enabled: bool,
    pub model_id: String,
    pub model_dir: Option<String>,
    pub max_len: usize,
}

impl Default for RerankerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model_id: "cross-encoder/ms-marco-MiniLM-L-6-v2".to_string(),
            model_dir: None,
            max_len: 512,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub uri: String,
    pub collection: String,
    /// Write documents/chunks provenance tables next to the vectors.
    pub provenance: bool,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self { uri: "data/lancedb".to_string(), collection: "agentdesk_docs".to_string(), provenance: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub chunk_tokens: usize,
    pub overlap: usize,
    pub tokenizer_path: Option<String>,
    pub redact_pii: bool,
    pub context_prefix: bool,
}

impl ChunkingSettings {
    pub fn config(&self) -> ChunkingConfig {
        ChunkingConfig { chunk_tokens: self.chunk_tokens, overlap: self.overlap }
    }
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        let cfg = ChunkingConfig::default();
        Self {
            chunk_tokens: cfg.chunk_tokens,
            overlap: cfg.overlap,
            tokenizer_path: None,
            redact_pii: true,
            context_prefix: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub coarse_limit: usize,
    pub default_top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { coarse_limit: 50, default_top_k: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub source_dir: String,
    pub extensions: Vec<String>,
    pub batch_size: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            source_dir: "sample_docs".to_string(),
            extensions: vec!["md".to_string(), "txt".to_string()],
            batch_size: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub timeout_secs: u64,
    pub max_tokens: usize,
    /// Tried in order; the first success wins.
    pub providers: Vec<ProviderSettings>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_tokens: 256,
            providers: vec![
                ProviderSettings::Local { model_dir: None, max_input_tokens: 512 },
                ProviderSettings::OpenAi {
                    base_url: "https://api.openai.com/v1".to_string(),
                    model: "gpt-4o-mini".to_string(),
                    api_key: None,
                    api_key_env: Some("OPENAI_API_KEY".to_string()),
                },
                ProviderSettings::Gemini {
                    base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                    model: "gemini-1.5-flash".to_string(),
                    api_key: None,
                    api_key_env: Some("GEMINI_API_KEY".to_string()),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderSettings {
    /// In-process T5 generator loaded from `model_dir`.
    Local { model_dir: Option<String>, max_input_tokens: usize },
    #[serde(rename = "openai")]
    OpenAi { base_url: String, model: String, api_key: Option<String>, api_key_env: Option<String> },
    Gemini { base_url: String, model: String, api_key: Option<String>, api_key_env: Option<String> },
}

impl ProviderSettings {
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderSettings::Local { .. } => "local",
            ProviderSettings::OpenAi { .. } => "openai",
            ProviderSettings::Gemini { .. } => "gemini",
        }
    }
}

/// Explicit key wins over the env var named by `api_key_env`.
pub fn resolve_api_key(api_key: Option<&str>, api_key_env: Option<&str>) -> Option<String> {
    api_key
        .map(str::to_string)
        .or_else(|| api_key_env.and_then(|name| env::var(name).ok()))
        .filter(|k| !k.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
    pub tool_keywords: Vec<String>,
    /// Priority stamped on tickets opened by the tool intent.
    pub ticket_priority: String,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            tool_keywords: vec!["ticket".to_string(), "issue".to_string()],
            ticket_priority: "medium".to_string(),
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
