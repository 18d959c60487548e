//! In-process flan-t5 generator with greedy decoding.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_transformers::models::t5::{Config as T5Config, T5ForConditionalGeneration};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use agentdesk_embed::device::select_device;
use agentdesk_embed::weights::{load_tokenizer, load_var_builder, read_json, resolve_model_dir};

use super::{LlmProvider, ProviderError};

const DEFAULT_MODEL_ID: &str = "google/flan-t5-small";

#[derive(Debug, Clone, Deserialize)]
struct DecodeConfig {
    #[serde(default)]
    pad_token_id: u32,
    #[serde(default = "default_eos")]
    eos_token_id: u32,
    decoder_start_token_id: Option<u32>,
    #[serde(default = "default_true")]
    use_cache: bool,
}

fn default_eos() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// The three decoder operations greedy generation needs.
trait Seq2Seq {
    fn encode(&mut self, input_ids: &Tensor) -> candle_core::Result<Tensor>;
    fn decode(&mut self, decoder_ids: &Tensor, encoder_output: &Tensor) -> candle_core::Result<Tensor>;
    fn clear_kv_cache(&mut self);
}

impl Seq2Seq for T5ForConditionalGeneration {
    fn encode(&mut self, input_ids: &Tensor) -> candle_core::Result<Tensor> {
        T5ForConditionalGeneration::encode(self, input_ids)
    }

    fn decode(&mut self, decoder_ids: &Tensor, encoder_output: &Tensor) -> candle_core::Result<Tensor> {
        T5ForConditionalGeneration::decode(self, decoder_ids, encoder_output)
    }

    fn clear_kv_cache(&mut self) {
        T5ForConditionalGeneration::clear_kv_cache(self)
    }
}

/// Argmax decoding until EOS or `max_tokens`. Returns the generated ids
/// without the start token.
fn greedy_decode<M: Seq2Seq>(
    model: &mut M,
    input_ids: &[u32],
    device: &Device,
    decode: &DecodeConfig,
    max_tokens: usize,
) -> Result<Vec<u32>> {
    // An earlier call may have bailed out mid-loop with its cache still filled.
    model.clear_kv_cache();
    let input = Tensor::new(input_ids, device)?.unsqueeze(0)?;
    let encoder_output = model.encode(&input)?;

    let start = decode.decoder_start_token_id.unwrap_or(decode.pad_token_id);
    let mut output = vec![start];
    for step in 0..max_tokens {
        let decoder_ids = if step == 0 || !decode.use_cache {
            Tensor::new(output.as_slice(), device)?.unsqueeze(0)?
        } else {
            let last = output[output.len() - 1];
            Tensor::new(&[last], device)?.unsqueeze(0)?
        };
        let logits = model.decode(&decoder_ids, &encoder_output)?.squeeze(0)?;
        let next = logits.argmax(0)?.to_scalar::<u32>()?;
        if next == decode.eos_token_id {
            break;
        }
        output.push(next);
    }
    model.clear_kv_cache();
    output.remove(0);
    Ok(output)
}

struct T5Runtime {
    model: T5ForConditionalGeneration,
    tokenizer: Tokenizer,
    device: Device,
    decode: DecodeConfig,
    max_input_tokens: usize,
}

impl T5Runtime {
    fn generate(&mut self, prompt: &str, max_tokens: usize) -> Result<String> {
        let enc = self.tokenizer.encode(prompt, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let mut ids = enc.get_ids().to_vec();
        if ids.len() > self.max_input_tokens {
            // Keep the tail: the question and answer instruction come last.
            ids.drain(..ids.len() - self.max_input_tokens);
        }
        let generated = greedy_decode(&mut self.model, &ids, &self.device, &self.decode, max_tokens)?;
        debug!(input_tokens = ids.len(), output_tokens = generated.len(), "Local generation");
        self.tokenizer
            .decode(&generated, true)
            .map_err(|e| anyhow!("Detokenization failed: {}", e))
    }
}

/// Loaded once and shared; generation runs on the blocking pool one request
/// at a time.
pub struct LocalT5Provider {
    runtime: Arc<Mutex<T5Runtime>>,
}

impl LocalT5Provider {
    pub fn load(model_dir: Option<&str>, max_input_tokens: usize) -> Result<Self> {
        let dir: PathBuf = resolve_model_dir(model_dir, DEFAULT_MODEL_ID)?;
        let device = select_device();
        info!(dir = %dir.display(), "Loading local T5 generator");
        let tokenizer = load_tokenizer(&dir)?;
        let config_path = dir.join("config.json");
        let config: T5Config = read_json(&config_path)?;
        let decode: DecodeConfig = read_json(&config_path)?;
        let vb = load_var_builder(&dir, &device)?;
        let model = T5ForConditionalGeneration::load(vb, &config)?;
        info!("Local T5 generator loaded");
        let runtime = T5Runtime { model, tokenizer, device, decode, max_input_tokens: max_input_tokens.max(1) };
        Ok(Self { runtime: Arc::new(Mutex::new(runtime)) })
    }
}

#[async_trait]
impl LlmProvider for LocalT5Provider {
    fn name(&self) -> &str {
        "local-t5"
    }

    async fn send(&self, prompt: &str, max_tokens: usize) -> Result<String, ProviderError> {
        let runtime = Arc::clone(&self.runtime);
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || {
            let mut rt = runtime.lock().map_err(|_| ProviderError::Model("generator lock poisoned".to_string()))?;
            rt.generate(&prompt, max_tokens).map_err(|e| ProviderError::Model(e.to_string()))
        })
        .await
        .map_err(|e| ProviderError::Model(format!("generation task failed: {e}")))?
    }
}
