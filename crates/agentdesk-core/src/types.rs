//! Domain types shared by the chunker, the vector index and the query path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::redact::redact_pii;

/// A source document as it enters ingestion.
///
/// - `doc_id`: stable external identity (file name or caller-supplied id)
/// - `full_text`: raw content, before redaction
/// - `redacted_text`: the text every chunk is cut from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: String,
    pub full_text: String,
    pub redacted_text: String,
}

impl Document {
    /// Build a document, masking emails and phone numbers when `redact` is set.
    pub fn new(doc_id: impl Into<String>, full_text: impl Into<String>, redact: bool) -> Self {
        let full_text = full_text.into();
        let redacted_text = if redact { redact_pii(&full_text) } else { full_text.clone() };
        Self { doc_id: doc_id.into(), full_text, redacted_text }
    }

    /// Hex blake3 digest of the redacted text.
    pub fn content_hash(&self) -> String {
        blake3::hash(self.redacted_text.as_bytes()).to_hex().to_string()
    }
}

/// A token window of a document's redacted text.
///
/// `char_start`/`char_end` are byte offsets into `Document::redacted_text`.
/// `chunk_id` counts from 0 in token order within one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub doc_id: String,
    pub chunk_id: u32,
    pub token_count: u32,
    pub char_start: usize,
    pub char_end: usize,
    pub text: String,
}

impl Chunk {
    /// Text handed to the embedder. With `with_context` the document id is
    /// prepended so chunks from different sources embed apart.
    pub fn embedding_text(&self, with_context: bool) -> String {
        if with_context {
            format!("Source: {}\n\n{}", self.doc_id, self.text)
        } else {
            self.text.clone()
        }
    }
}

/// Metadata stored next to every vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub doc_id: String,
    pub chunk_id: u32,
    pub text: String,
    pub char_start: usize,
    pub char_end: usize,
    pub token_count: u32,
}

impl From<&Chunk> for Payload {
    fn from(chunk: &Chunk) -> Self {
        Self {
            doc_id: chunk.doc_id.clone(),
            chunk_id: chunk.chunk_id,
            text: chunk.text.clone(),
            char_start: chunk.char_start,
            char_end: chunk.char_end,
            token_count: chunk.token_count,
        }
    }
}

/// The unit stored in a vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

impl IndexedPoint {
    /// Wrap a chunk and its embedding under a fresh random id.
    pub fn from_chunk(chunk: &Chunk, vector: Vec<f32>) -> Self {
        Self { id: uuid::Uuid::new_v4().to_string(), vector, payload: Payload::from(chunk) }
    }
}

/// A search result. `score` is the coarse cosine similarity until a reranker
/// overwrites it; `coarse_score` always keeps the index's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub point_id: String,
    #[serde(flatten)]
    pub payload: Payload,
    pub score: f32,
    pub coarse_score: f32,
}

impl RetrievalHit {
    pub fn new(point_id: impl Into<String>, payload: Payload, score: f32) -> Self {
        Self { point_id: point_id.into(), payload, score, coarse_score: score }
    }

    pub fn text(&self) -> &str {
        &self.payload.text
    }

    pub fn source(&self) -> SourceRef {
        SourceRef { doc_id: self.payload.doc_id.clone(), chunk_id: self.payload.chunk_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub top_k: usize,
}

impl Query {
    pub fn new(text: impl Into<String>, top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(Error::InvalidQuery("top_k must be at least 1".to_string()));
        }
        Ok(Self { text: text.into(), top_k })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub doc_id: String,
    pub chunk_id: u32,
}

/// Result of the `answer` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub query: String,
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

/// Similarity used by every index. Fixed for the lifetime of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
}

pub const TICKET_TITLE_MAX: usize = 200;
pub const TICKET_DESCRIPTION_MAX: usize = 4000;

/// A support ticket opened by the tool intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    /// New `created` ticket; title and description are cut to their maximum
    /// length in characters.
    pub fn new(title: &str, description: &str, priority: impl Into<String>) -> Self {
        Self {
            ticket_id: uuid::Uuid::new_v4().to_string(),
            title: title.chars().take(TICKET_TITLE_MAX).collect(),
            description: description.chars().take(TICKET_DESCRIPTION_MAX).collect(),
            priority: priority.into(),
            status: "created".to_string(),
            created_at: Utc::now(),
        }
    }
}
