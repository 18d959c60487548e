use std::sync::Arc;
use tracing::debug;

use agentdesk_core::traits::{Embedder, VectorIndex};
use agentdesk_core::types::RetrievalHit;
use agentdesk_core::{Error, Result};

/// Embeds a query and runs a wide similarity search.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    coarse_limit: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, coarse_limit: usize) -> Self {
        Self { embedder, index, coarse_limit: coarse_limit.max(1) }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Pool size searched for a request of `top_k` results.
    pub fn coarse_limit_for(&self, top_k: usize) -> usize {
        self.coarse_limit.max(top_k)
    }

    /// Coarse candidates, best cosine first. Never more than
    /// `max(coarse_limit, top_k)`.
    pub async fn retrieve(&self, query_text: &str, top_k: usize) -> Result<Vec<RetrievalHit>> {
        let query_vector = embed_blocking(&self.embedder, query_text.to_string()).await?;
        let limit = self.coarse_limit_for(top_k);
        let mut hits = self.index.search(&query_vector, limit).await?;
        hits.truncate(limit);
        debug!(limit, hits = hits.len(), "Coarse retrieval");
        Ok(hits)
    }
}

/// Run one embedding on the blocking pool.
pub(crate) async fn embed_blocking(embedder: &Arc<dyn Embedder>, text: String) -> Result<Vec<f32>> {
    let embedder = Arc::clone(embedder);
    tokio::task::spawn_blocking(move || embedder.embed(&text))
        .await
        .map_err(|e| Error::EmbeddingUnavailable(format!("embedding task failed: {e}")))?
}
