//! Token-window chunking with fixed overlap.

use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::tokenize::{TokenScheme, WhitespaceScheme};
use crate::types::{Chunk, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_tokens: usize,
    pub overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_tokens: usize, overlap: usize) -> Result<Self> {
        let cfg = Self { chunk_tokens, overlap };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_tokens <= self.overlap {
            return Err(Error::Configuration(format!(
                "chunk_tokens ({}) must be greater than overlap ({})",
                self.chunk_tokens, self.overlap
            )));
        }
        Ok(())
    }

    pub fn step(&self) -> usize {
        self.chunk_tokens - self.overlap
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_tokens: 500, overlap: 50 }
    }
}

/// Token index ranges of every window over a stream of `n` tokens.
pub fn window_ranges(n: usize, cfg: &ChunkingConfig) -> Vec<Range<usize>> {
    let mut windows = Vec::new();
    if n == 0 {
        return windows;
    }
    let step = cfg.step();
    let mut start = 0;
    loop {
        let end = (start + cfg.chunk_tokens).min(n);
        windows.push(start..end);
        if end >= n {
            break;
        }
        start += step;
    }
    windows
}

#[derive(Clone)]
pub struct Chunker {
    scheme: Arc<dyn TokenScheme>,
    config: ChunkingConfig,
}

impl std::fmt::Debug for Chunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunker")
            .field("scheme", &self.scheme.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Chunker {
    pub fn new(scheme: Arc<dyn TokenScheme>, config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { scheme, config })
    }

    pub fn whitespace(config: ChunkingConfig) -> Result<Self> {
        Self::new(Arc::new(WhitespaceScheme), config)
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    pub fn scheme(&self) -> &Arc<dyn TokenScheme> {
        &self.scheme
    }

    /// Chunk the already-redacted text of a document.
    pub fn chunk_document(&self, document: &Document) -> Result<Vec<Chunk>> {
        self.chunk(&document.doc_id, &document.redacted_text)
    }

    pub fn chunk(&self, doc_id: &str, text: &str) -> Result<Vec<Chunk>> {
        self.chunk_text(doc_id, text, self.config.chunk_tokens, self.config.overlap)
    }

    /// Split `text` into windows of `chunk_tokens` tokens sharing `overlap`
    /// tokens with their predecessor. Spans are byte offsets into `text`.
    pub fn chunk_text(&self, doc_id: &str, text: &str, chunk_tokens: usize, overlap: usize) -> Result<Vec<Chunk>> {
        let cfg = ChunkingConfig::new(chunk_tokens, overlap)?;
        let tokens = self.scheme.tokenize(text)?;
        let windows = window_ranges(tokens.len(), &cfg);

        let mut chunks = Vec::with_capacity(windows.len());
        for (idx, range) in windows.into_iter().enumerate() {
            let window = &tokens[range];
            let (Some(first), Some(last)) = (window.first(), window.last()) else {
                continue;
            };
            chunks.push(Chunk {
                doc_id: doc_id.to_string(),
                chunk_id: u32::try_from(idx).map_err(|_| Error::Configuration("too many chunks".to_string()))?,
                token_count: u32::try_from(window.len())
                    .map_err(|_| Error::Configuration("chunk too large".to_string()))?,
                char_start: first.start,
                char_end: last.end,
                text: self.scheme.detokenize(window)?,
            });
        }
        debug!(doc_id, tokens = tokens.len(), chunks = chunks.len(), scheme = self.scheme.name(), "Chunked document");
        Ok(chunks)
    }
}
