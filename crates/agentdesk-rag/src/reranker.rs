use std::sync::Arc;
use tracing::{debug, info, warn};

use agentdesk_core::traits::RelevanceScorer;
use agentdesk_core::types::RetrievalHit;
use agentdesk_core::{Error, Result};

/// Cross-encoder reranking with pass-through degradation.
///
/// Without a scorer the reranker is degraded and returns `hits[..top_k]`
/// untouched. A scorer failure on one query degrades that query only.
#[derive(Clone)]
pub struct Reranker {
    scorer: Option<Arc<dyn RelevanceScorer>>,
}

impl Reranker {
    pub fn new(scorer: Arc<dyn RelevanceScorer>) -> Self {
        Self { scorer: Some(scorer) }
    }

    pub fn degraded(reason: &str) -> Self {
        warn!(reason, "Reranker running in degraded pass-through mode");
        Self { scorer: None }
    }

    /// Degraded when the scorer failed to load.
    pub fn from_loaded(loaded: Result<Arc<dyn RelevanceScorer>>) -> Self {
        match loaded {
            Ok(scorer) => {
                info!("Reranker active");
                Self::new(scorer)
            }
            Err(e) => Self::degraded(&e.to_string()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.scorer.is_none()
    }

    pub async fn rerank(&self, query_text: &str, mut hits: Vec<RetrievalHit>, top_k: usize) -> Vec<RetrievalHit> {
        let Some(scorer) = self.scorer.clone() else {
            warn!("Reranker degraded; keeping coarse order");
            hits.truncate(top_k);
            return hits;
        };
        if hits.is_empty() {
            return hits;
        }
        let query = query_text.to_string();
        let texts: Vec<String> = hits.iter().map(|h| h.payload.text.clone()).collect();
        let scored = tokio::task::spawn_blocking(move || scorer.score_pairs(&query, &texts))
            .await
            .map_err(|e| Error::RerankDegraded(format!("scoring task failed: {e}")))
            .and_then(|r| r);
        match scored {
            Ok(scores) if scores.len() == hits.len() => {
                debug!(candidates = hits.len(), top_k, "Reranked");
                apply_scores(hits, &scores, top_k)
            }
            Ok(scores) => {
                warn!(expected = hits.len(), got = scores.len(), "Scorer returned wrong number of scores; keeping coarse order");
                hits.truncate(top_k);
                hits
            }
            Err(e) => {
                warn!(error = %e, "Rerank failed; keeping coarse order");
                hits.truncate(top_k);
                hits
            }
        }
    }
}

/// Overwrite scores, stable-sort descending and keep `top_k`. Ties keep their
/// incoming order. `scores` must be as long as `hits`.
pub fn apply_scores(mut hits: Vec<RetrievalHit>, scores: &[f32], top_k: usize) -> Vec<RetrievalHit> {
    for (hit, score) in hits.iter_mut().zip(scores) {
        hit.score = *score;
    }
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(top_k);
    hits
}
