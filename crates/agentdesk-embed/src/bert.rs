use anyhow::{ensure, Result};
use candle_core::{DType, Device};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use std::path::Path;
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use agentdesk_core::{traits::Embedder, Error};

use crate::device::select_device;
use crate::encode::encode_batch;
use crate::pool::masked_mean_l2;
use crate::weights::{load_tokenizer, load_var_builder, read_json};

#[derive(Deserialize)]
struct Width {
    hidden_size: usize,
}

/// Sentence embedder over a BERT-family encoder with masked mean pooling.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
}

impl BertEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "Loading sentence embedding model");
        let tokenizer = load_tokenizer(model_dir)?;
        let config_path = model_dir.join("config.json");
        let config: BertConfig = read_json(&config_path)?;
        let dim = read_json::<Width>(&config_path)?.hidden_size;
        let vb = load_var_builder(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        info!(dim, max_len, "Embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len })
    }

    fn forward(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let (input_ids, token_type_ids, attention_mask) =
            encode_batch(&self.tokenizer, inputs, self.max_len, &self.device)?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask.to_dtype(DType::F32)?)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        ensure!(vectors.len() == texts.len(), "expected {} vectors, got {}", texts.len(), vectors.len());
        ensure!(vectors.iter().all(|v| v.len() == self.dim), "embedding width differs from hidden_size {}", self.dim);
        let elapsed = start.elapsed().as_millis();
        if elapsed > 500 {
            warn!(batch = texts.len(), elapsed_ms = elapsed, "Slow embedding batch");
        } else {
            debug!(batch = texts.len(), elapsed_ms = elapsed, "Embedded batch");
        }
        Ok(vectors)
    }
}

impl Embedder for BertEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        self.max_len
    }

    fn embed_batch(&self, texts: &[String]) -> agentdesk_core::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.forward(texts).map_err(|e| Error::EmbeddingUnavailable(e.to_string()))
    }
}
