//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults, `config.toml`,
//! `config.<env>.toml` and `APP_*` env vars (`__` separates nested keys,
//! e.g. `APP_RETRIEVAL__TOP_K=3`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::chunker::ChunkingConfig;
use crate::error::Error;

pub const DEFAULT_QUERY: &str = "key insights and risks";
/// Smallest token budget that still leaves room for the special tokens.
pub const MIN_MAX_LEN: usize = 8;

/// Which query drives retrieval and how many chunks it keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub query: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5, query: DEFAULT_QUERY.to_string() }
    }
}

impl RetrievalConfig {
    pub fn top_k(&self) -> crate::error::Result<NonZeroUsize> {
        NonZeroUsize::new(self.top_k)
            .ok_or_else(|| Error::InvalidConfig("top_k must be positive".into()))
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        self.top_k()?;
        if self.query.trim().is_empty() {
            return Err(Error::InvalidConfig("retrieval query must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Directory holding `config.json`, `tokenizer.json` and the weights.
    pub model_dir: Option<String>,
    /// Token budget per input, special tokens included.
    pub max_len: usize,
    /// Inputs per model forward pass.
    pub batch_size: usize,
    /// Use the hashing embedder instead of loading a model.
    pub use_fake: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { model_dir: None, max_len: 256, batch_size: 32, use_fake: false }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding batch_size must be positive".into()));
        }
        if self.max_len < MIN_MAX_LEN {
            return Err(Error::InvalidConfig(format!(
                "embedding max_len must be at least {MIN_MAX_LEN}, got {}",
                self.max_len
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    pub model: String,
    pub endpoint: String,
    /// Name of the environment variable carrying the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub insight: InsightConfig,
}

impl Settings {
    pub fn validate(&self) -> crate::error::Result<()> {
        self.chunking.validate()?;
        self.retrieval.validate()?;
        self.embedding.validate()
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        tracing::debug!(env = %env_name, "configuration sources merged");
        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed settings, validated.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
