use anyhow::{ensure, Result};
use candle_core::{Device, IndexOp, Module};
use candle_nn::{linear, Linear};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use std::path::Path;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use agentdesk_core::{traits::RelevanceScorer, Error};

use crate::device::select_device;
use crate::encode::encode_batch;
use crate::weights::{load_tokenizer, load_var_builder, read_json};

#[derive(Deserialize)]
struct HeadConfig {
    hidden_size: usize,
}

/// BERT sequence-classification cross-encoder: `[CLS] query [SEP] passage [SEP]`
/// through the encoder, pooler and a single-logit classifier.
pub struct CrossEncoderScorer {
    model: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
}

impl CrossEncoderScorer {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "Loading cross-encoder");
        let tokenizer = load_tokenizer(model_dir)?;
        let config_path = model_dir.join("config.json");
        let config: BertConfig = read_json(&config_path)?;
        let head: HeadConfig = read_json(&config_path)?;
        let vb = load_var_builder(model_dir, &device)?;
        let encoder_vb = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") { vb.pp("bert") } else { vb.clone() };
        let model = BertModel::load(encoder_vb.clone(), &config)?;
        let pooler = linear(head.hidden_size, head.hidden_size, encoder_vb.pp("pooler").pp("dense"))?;
        let classifier = linear(head.hidden_size, 1, vb.pp("classifier"))?;
        info!("Cross-encoder loaded");
        Ok(Self { model, pooler, classifier, tokenizer, device, max_len })
    }

    fn logits(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>> {
        let pairs: Vec<(&str, &str)> = candidates.iter().map(|c| (query, c.as_str())).collect();
        let (input_ids, token_type_ids, attention_mask) =
            encode_batch(&self.tokenizer, pairs, self.max_len, &self.device)?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let cls = hidden.i((.., 0, ..))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let scores: Vec<f32> = self.classifier.forward(&pooled)?.squeeze(1)?.to_device(&Device::Cpu)?.to_vec1()?;
        ensure!(scores.len() == candidates.len(), "expected {} scores, got {}", candidates.len(), scores.len());
        debug!(pairs = candidates.len(), "Scored pairs");
        Ok(scores)
    }
}

impl RelevanceScorer for CrossEncoderScorer {
    fn score_pairs(&self, query: &str, candidates: &[String]) -> agentdesk_core::Result<Vec<f32>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        self.logits(query, candidates).map_err(|e| Error::RerankDegraded(e.to_string()))
    }
}
