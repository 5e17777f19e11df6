use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Failed to create embeddings: {0}")]
    Embedding(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported file type: {0} (only PDF and TXT are supported)")]
    UnsupportedFormat(String),

    #[error("Failed to load document {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("Insight generation failed: {0}")]
    Generation(String),
}

impl Error {
    /// Wraps an `anyhow` chain into an embedding failure, keeping every cause.
    pub fn embedding(err: &anyhow::Error) -> Self {
        Self::Embedding(format!("{err:#}"))
    }

    pub fn generation(err: &anyhow::Error) -> Self {
        Self::Generation(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
