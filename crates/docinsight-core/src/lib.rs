pub mod chunker;
pub mod config;
pub mod error;
pub mod loader;
pub mod traits;
pub mod types;

pub use chunker::{chunk_text, ChunkingConfig};
pub use error::{Error, Result};
pub use traits::Embedder;
pub use types::{AnalysisReport, Retrieval, ScoredChunk};
