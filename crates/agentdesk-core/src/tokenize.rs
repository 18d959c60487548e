//! Swappable, deterministic token schemes used for chunking and token estimates.

use std::path::Path;
use std::sync::Arc;

use tokenizers::Tokenizer;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// One token with its byte span in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub piece: String,
    pub id: Option<u32>,
    pub start: usize,
    pub end: usize,
}

pub trait TokenScheme: Send + Sync {
    fn name(&self) -> &str;
    fn tokenize(&self, text: &str) -> Result<Vec<Token>>;
    fn detokenize(&self, tokens: &[Token]) -> Result<String>;

    fn count(&self, text: &str) -> Result<usize> {
        Ok(self.tokenize(text)?.len())
    }
}

/// Splits on Unicode whitespace. Used when no tokenizer file is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceScheme;

impl TokenScheme for WhitespaceScheme {
    fn name(&self) -> &str {
        "whitespace"
    }

    fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut word_start: Option<usize> = None;
        for (idx, ch) in text.char_indices() {
            match (ch.is_whitespace(), word_start) {
                (true, Some(start)) => {
                    tokens.push(Token { piece: text[start..idx].to_string(), id: None, start, end: idx });
                    word_start = None;
                }
                (false, None) => word_start = Some(idx),
                _ => {}
            }
        }
        if let Some(start) = word_start {
            tokens.push(Token { piece: text[start..].to_string(), id: None, start, end: text.len() });
        }
        Ok(tokens)
    }

    fn detokenize(&self, tokens: &[Token]) -> Result<String> {
        Ok(tokens.iter().map(|t| t.piece.as_str()).collect::<Vec<_>>().join(" "))
    }
}

/// HuggingFace `tokenizer.json` backed scheme. Special tokens are not added.
pub struct SubwordScheme {
    tokenizer: Tokenizer,
}

impl SubwordScheme {
    pub fn from_file(path: &Path) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| Error::Tokenization(format!("{}: {}", path.display(), e)))?;
        Self::from_tokenizer(tokenizer)
    }

    /// Truncation and padding shipped in `tokenizer.json` are switched off so
    /// every token of a document reaches the chunker.
    pub fn from_tokenizer(mut tokenizer: Tokenizer) -> Result<Self> {
        tokenizer
            .with_truncation(None)
            .map_err(|e| Error::Tokenization(e.to_string()))?;
        tokenizer.with_padding(None);
        Ok(Self { tokenizer })
    }
}

impl TokenScheme for SubwordScheme {
    fn name(&self) -> &str {
        "subword"
    }

    fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        let enc = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| Error::Tokenization(e.to_string()))?;
        Ok(enc
            .get_tokens()
            .iter()
            .zip(enc.get_ids())
            .zip(enc.get_offsets())
            .map(|((piece, id), (start, end))| Token { piece: piece.clone(), id: Some(*id), start: *start, end: *end })
            .collect())
    }

    fn detokenize(&self, tokens: &[Token]) -> Result<String> {
        let ids = tokens
            .iter()
            .map(|t| {
                t.id.or_else(|| self.tokenizer.token_to_id(&t.piece))
                    .ok_or_else(|| Error::Tokenization(format!("unknown token '{}'", t.piece)))
            })
            .collect::<Result<Vec<u32>>>()?;
        self.tokenizer
            .decode(&ids, true)
            .map_err(|e| Error::Tokenization(e.to_string()))
    }
}

/// Subword scheme when `tokenizer_path` loads, whitespace otherwise.
pub fn load_scheme(tokenizer_path: Option<&Path>) -> Arc<dyn TokenScheme> {
    match tokenizer_path {
        Some(path) => match SubwordScheme::from_file(path) {
            Ok(scheme) => {
                info!(path = %path.display(), "Using subword token scheme");
                Arc::new(scheme)
            }
            Err(e) => {
                warn!(error = %e, "Tokenizer could not be loaded; falling back to whitespace scheme");
                Arc::new(WhitespaceScheme)
            }
        },
        None => {
            warn!("No tokenizer configured; using whitespace token scheme");
            Arc::new(WhitespaceScheme)
        }
    }
}

/// Token count of `text` under `scheme`, zero if the scheme fails.
pub fn estimate_tokens(scheme: &dyn TokenScheme, text: &str) -> usize {
    match scheme.count(text) {
        Ok(n) => n,
        Err(e) => {
            warn!(scheme = scheme.name(), error = %e, "Token estimate failed; reporting 0");
            0
        }
    }
}
