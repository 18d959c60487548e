use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::types::{Chunk, DistanceMetric, Document, IndexedPoint, RetrievalHit, Ticket};

/// Text to fixed-size vector. Implementations are loaded once and shared.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    /// One vector per input, in input order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| Error::EmbeddingUnavailable("embedder returned no vector".to_string()))
    }
}

/// Joint (query, candidate) relevance scoring, higher is more relevant.
pub trait RelevanceScorer: Send + Sync {
    fn score_pairs(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>>;
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create storage for `dimension`-sized vectors if absent. Fails with
    /// `Error::Configuration` when the existing collection has another size.
    async fn ensure_collection(&self, dimension: usize, metric: DistanceMetric) -> Result<()>;
    /// Insert or replace points by id. Returns the number written.
    async fn upsert(&self, points: &[IndexedPoint]) -> Result<usize>;
    /// At most `limit` hits, most similar first.
    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<RetrievalHit>>;
    async fn delete_document(&self, doc_id: &str) -> Result<()>;
    async fn count(&self) -> Result<usize>;
}

/// Write-only record of what was ingested.
#[async_trait]
pub trait ProvenanceStore: Send + Sync {
    async fn record_document(&self, document: &Document) -> Result<()>;
    /// Replace every chunk row of `doc_id` with `chunks`.
    async fn record_chunks(&self, doc_id: &str, chunks: &[Chunk]) -> Result<()>;
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create_ticket(&self, ticket: &Ticket) -> Result<()>;
}
