//! In-memory vector index using cosine similarity.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use agentdesk_core::traits::VectorIndex;
use agentdesk_core::types::{DistanceMetric, IndexedPoint, RetrievalHit};
use agentdesk_core::{Error, Result};

#[derive(Debug, Default)]
struct State {
    dimension: Option<usize>,
    points: BTreeMap<String, IndexedPoint>,
}

/// Points keyed by id behind a `tokio::sync::RwLock`. Iteration order is by
/// id, so equal scores come back in a stable order.
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    state: RwLock<State>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn require_dimension(state: &State, len: usize) -> Result<()> {
    match state.dimension {
        None => Err(Error::IndexUnavailable("collection has not been created".to_string())),
        Some(d) if d != len => Err(Error::Configuration(format!("vector length {len} does not match dimension {d}"))),
        Some(_) => Ok(()),
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn ensure_collection(&self, dimension: usize, _metric: DistanceMetric) -> Result<()> {
        let mut state = self.state.write().await;
        match state.dimension {
            Some(d) if d != dimension => {
                Err(Error::Configuration(format!("collection has dimension {d}, requested {dimension}")))
            }
            _ => {
                state.dimension = Some(dimension);
                Ok(())
            }
        }
    }

    async fn upsert(&self, points: &[IndexedPoint]) -> Result<usize> {
        let mut state = self.state.write().await;
        for p in points {
            require_dimension(&state, p.vector.len())?;
        }
        for p in points {
            state.points.insert(p.id.clone(), p.clone());
        }
        Ok(points.len())
    }

    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<RetrievalHit>> {
        let state = self.state.read().await;
        require_dimension(&state, query_vector.len())?;
        let mut scored: Vec<RetrievalHit> = state
            .points
            .values()
            .map(|p| RetrievalHit::new(p.id.clone(), p.payload.clone(), cosine_similarity(&p.vector, query_vector)))
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn delete_document(&self, doc_id: &str) -> Result<()> {
        self.state.write().await.points.retain(|_, p| p.payload.doc_id != doc_id);
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.state.read().await.points.len())
    }
}
