use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid sizing, dimension mismatch or unreadable settings. Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The vector index or provenance store could not be reached. Callers may retry.
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// The reranker could not score; the pipeline keeps coarse ordering.
    #[error("Rerank degraded: {0}")]
    RerankDegraded(String),

    #[error("All LLM providers failed: {}", .attempts.join("; "))]
    LlmUnavailable { attempts: Vec<String> },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Tool action failed: {0}")]
    ToolFailed(String),

    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
