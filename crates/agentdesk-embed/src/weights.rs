//! Locating model directories and reading their weights into a `VarBuilder`.

use anyhow::{anyhow, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;
use tracing::info;

use agentdesk_core::config::expand_path;

/// Configured directory first, then `models/<name>` derived from the model id.
pub fn resolve_model_dir(configured: Option<&str>, model_id: &str) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() {
            info!(dir = %p.display(), "Using configured model dir");
            return Ok(p);
        }
        return Err(anyhow!("Configured model dir {} does not exist", p.display()));
    }
    let name = model_id.rsplit('/').next().unwrap_or(model_id);
    for candidate in [Path::new("models").join(name), Path::new("../models").join(name)] {
        if candidate.exists() {
            info!(dir = %candidate.display(), "Using model dir");
            return Ok(candidate);
        }
    }
    Err(anyhow!("Could not locate model directory for {}", model_id))
}

pub fn load_tokenizer(model_dir: &Path) -> Result<Tokenizer> {
    let path = model_dir.join("tokenizer.json");
    Tokenizer::from_file(&path).map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Prefers `model.safetensors`, falls back to `pytorch_model.bin`.
pub fn load_var_builder(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    let tensors: HashMap<String, Tensor> = if safetensors.exists() {
        candle_core::safetensors::load(&safetensors, device)?
    } else {
        let bin = model_dir.join("pytorch_model.bin");
        candle_core::pickle::read_all(&bin)
            .with_context(|| format!("reading {}", bin.display()))?
            .into_iter()
            .collect()
    };
    Ok(VarBuilder::from_tensors(tensors, DType::F32, device))
}
