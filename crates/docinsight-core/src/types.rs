//! Domain types shared by the store, the pipeline and the front ends.

use serde::{Deserialize, Serialize};

/// A retrieved chunk with its squared L2 distance to the query.
///
/// Lower is closer. Results are always ordered nearest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub text: String,
    pub distance: f32,
}

/// Outcome of one retrieval run over a single document.
///
/// `num_chunks` counts every chunk the document produced, `hits` holds the
/// top-k subset. An empty `hits` with a non-zero `num_chunks` means retrieval
/// degraded; callers continue with an empty context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retrieval {
    pub num_chunks: usize,
    pub hits: Vec<ScoredChunk>,
}

impl Retrieval {
    /// Chunk texts in ranked order, distances dropped.
    pub fn texts(&self) -> Vec<String> {
        self.hits.iter().map(|h| h.text.clone()).collect()
    }

    pub fn into_texts(self) -> Vec<String> {
        self.hits.into_iter().map(|h| h.text).collect()
    }

    pub fn is_degraded(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Final result of analysing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub num_chunks: usize,
    pub retrieved: Vec<String>,
    pub insights: String,
}
