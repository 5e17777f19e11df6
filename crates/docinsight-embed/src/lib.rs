//! docinsight-embed
//!
//! Sentence embeddings for document chunks. `BertEmbedder` runs a
//! sentence-transformers BERT checkpoint (all-MiniLM-L6-v2 by default) through
//! candle with masked mean pooling; `FakeEmbedder` is a hashing stand-in for
//! tests and development.

pub mod device;
pub mod pool;
pub mod tokenize;

use anyhow::{anyhow, ensure, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use tokenizers::Tokenizer;

use docinsight_core::config::{expand_path, EmbeddingConfig};
use docinsight_core::traits::Embedder;

pub use pool::masked_mean_l2;

pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";
pub const FAKE_DIM: usize = 384;

/// Fields of `config.json` the embedder needs beyond what `BertModel` reads.
#[derive(Deserialize)]
struct ModelShape {
    hidden_size: usize,
    #[serde(default)]
    pad_token_id: u32,
}

pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    batch_size: usize,
    pad_id: u32,
}

impl BertEmbedder {
    pub fn load(model_dir: &Path, max_len: usize, batch_size: usize) -> Result<Self> {
        ensure!(batch_size > 0, "batch_size must be positive");
        let device = device::select_device();
        tracing::info!(dir = %model_dir.display(), "loading embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e)
        })?;
        tokenize::configure_tokenizer(&mut tokenizer, max_len)?;

        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&raw_config)?;
        let shape: ModelShape = serde_json::from_str(&raw_config)?;

        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = BertModel::load(vb, &config)?;

        tracing::info!(dim = shape.hidden_size, max_len, batch_size, "embedding model loaded");
        Ok(Self {
            model,
            tokenizer,
            device,
            dim: shape.hidden_size,
            batch_size,
            pad_id: shape.pad_token_id,
        })
    }

    /// One forward pass over `texts`.
    fn forward_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let batch = tokenize::tokenize_batch(&self.tokenizer, texts, self.pad_id, &self.device)?;
        let hidden = self
            .model
            .forward(&batch.input_ids, &batch.token_type_ids, Some(&batch.attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &batch.attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        tracing::debug!(
            batch = texts.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "embedded batch"
        );
        Ok(vectors)
    }
}

impl Embedder for BertEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        embed_in_batches(texts, self.batch_size, |sub| self.forward_batch(sub))
    }
}

/// Feed `texts` to `embed` in slices of at most `batch_size`, concatenating
/// the vectors in input order. The first failing slice aborts the whole call.
pub fn embed_in_batches<F>(
    texts: &[String],
    batch_size: usize,
    mut embed: F,
) -> Result<Vec<Vec<f32>>>
where
    F: FnMut(&[String]) -> Result<Vec<Vec<f32>>>,
{
    let mut out = Vec::with_capacity(texts.len());
    for (i, sub) in texts.chunks(batch_size.max(1)).enumerate() {
        let vectors = embed(sub).with_context(|| format!("embedding sub-batch {i}"))?;
        ensure!(
            vectors.len() == sub.len(),
            "sub-batch {i} returned {} vectors for {} inputs",
            vectors.len(),
            sub.len()
        );
        out.extend(vectors);
    }
    Ok(out)
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        return candle_core::pickle::read_all(&pickle)?
            .into_iter()
            .map(|(name, tensor)| -> Result<(String, Tensor)> {
                Ok((name, tensor.to_device(device)?))
            })
            .collect();
    }
    Err(anyhow!("No model.safetensors or pytorch_model.bin in {}", model_dir.display()))
}

/// Deterministic bag-of-words hashing embedder. Same text, same vector;
/// texts sharing words land closer together.
pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim } }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

impl FakeEmbedder {
    fn embed_one(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

/// Load the process-wide embedder once; callers share it behind the `Arc`.
///
/// `APP_USE_FAKE_EMBEDDINGS=1` forces the fake embedder regardless of config.
pub fn get_default_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    let env_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if config.use_fake || env_fake {
        tracing::warn!("using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(FAKE_DIM)));
    }
    let model_dir = resolve_model_dir(config.model_dir.as_deref())?;
    Ok(Arc::new(BertEmbedder::load(&model_dir, config.max_len, config.batch_size)?))
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() { return Ok(p); }
        return Err(anyhow!("Configured model directory {} does not exist", p.display()));
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = expand_path(&dir);
            if p.exists() {
                tracing::debug!(var, dir = %p.display(), "model dir from environment");
                return Ok(p);
            }
        }
    }
    let candidates = [
        PathBuf::from("models").join(DEFAULT_MODEL_NAME),
        PathBuf::from("../models").join(DEFAULT_MODEL_NAME),
    ];
    candidates
        .into_iter()
        .find(|p| p.exists())
        .ok_or_else(|| anyhow!("Could not locate {} model directory", DEFAULT_MODEL_NAME))
}
