//! Deterministic stand-ins that need no model files.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use agentdesk_core::traits::{Embedder, RelevanceScorer};
use agentdesk_core::Result;

fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Hashes lowercase terms into buckets and L2-normalises. Texts sharing terms
/// land close together under cosine similarity.
#[derive(Debug, Clone)]
pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in terms(text) {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            v[idx] += 0.5 + ((h >> 32) as u32) as f32 / u32::MAX as f32;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm == 0.0 {
            // No terms: a fixed unit vector keeps cosine similarity defined.
            v[0] = 1.0;
            return v;
        }
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        usize::MAX
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Fraction of distinct query terms present in the candidate.
#[derive(Debug, Clone, Default)]
pub struct FakeScorer;

impl RelevanceScorer for FakeScorer {
    fn score_pairs(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>> {
        let query_terms: HashSet<String> = terms(query).collect();
        if query_terms.is_empty() {
            return Ok(vec![0.0; candidates.len()]);
        }
        Ok(candidates
            .iter()
            .map(|c| {
                let cand: HashSet<String> = terms(c).collect();
                query_terms.intersection(&cand).count() as f32 / query_terms.len() as f32
            })
            .collect())
    }
}
