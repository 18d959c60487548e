//! Embedding and relevance-scoring models.
//!
//! Real models run through candle on a BERT-family encoder; the fake variants
//! hash terms so pipelines can run without weights on disk.

pub mod bert;
pub mod cross_encoder;
pub mod device;
mod encode;
pub mod fake;
pub mod pool;
pub mod weights;

use std::sync::Arc;
use tracing::{info, warn};

use agentdesk_core::config::{EmbeddingSettings, RerankerSettings};
use agentdesk_core::traits::{Embedder, RelevanceScorer};
use agentdesk_core::{Error, Result};

pub use bert::BertEmbedder;
pub use cross_encoder::CrossEncoderScorer;
pub use fake::{FakeEmbedder, FakeScorer};
pub use pool::masked_mean_l2;

fn env_flag(key: &str) -> bool {
    std::env::var(key).ok().is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// The configured embedder, or the fake one when `use_fake` or
/// `APP_USE_FAKE_EMBEDDINGS` is set. Fails if the model width differs from
/// `settings.dimension`.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if settings.use_fake || env_flag("APP_USE_FAKE_EMBEDDINGS") {
        info!(dim = settings.dimension, "Using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(settings.dimension)));
    }
    let dir = weights::resolve_model_dir(settings.model_dir.as_deref(), &settings.model_id)
        .map_err(|e| Error::EmbeddingUnavailable(e.to_string()))?;
    let embedder = BertEmbedder::load(&dir, settings.max_len).map_err(|e| Error::EmbeddingUnavailable(e.to_string()))?;
    if embedder.dim() != settings.dimension {
        return Err(Error::Configuration(format!(
            "embedding model width {} differs from configured dimension {}",
            embedder.dim(),
            settings.dimension
        )));
    }
    Ok(Arc::new(embedder))
}

/// The configured cross-encoder. `APP_USE_FAKE_RERANKER` selects [`FakeScorer`].
/// An error here means the reranker should start degraded.
pub fn load_scorer(settings: &RerankerSettings) -> Result<Arc<dyn RelevanceScorer>> {
    if !settings.enabled {
        return Err(Error::RerankDegraded("reranker disabled by configuration".to_string()));
    }
    if env_flag("APP_USE_FAKE_RERANKER") {
        info!("Using FakeScorer");
        return Ok(Arc::new(FakeScorer));
    }
    let loaded = weights::resolve_model_dir(settings.model_dir.as_deref(), &settings.model_id)
        .and_then(|dir| CrossEncoderScorer::load(&dir, settings.max_len));
    match loaded {
        Ok(scorer) => Ok(Arc::new(scorer)),
        Err(e) => {
            warn!(model = %settings.model_id, error = %e, "Cross-encoder unavailable");
            Err(Error::RerankDegraded(e.to_string()))
        }
    }
}
