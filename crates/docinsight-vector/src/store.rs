use anyhow::ensure;
use std::num::NonZeroUsize;
use std::sync::Arc;

use docinsight_core::error::{Error, Result};
use docinsight_core::traits::Embedder;
use docinsight_core::types::ScoredChunk;

use crate::index::FlatL2Index;

/// Per-document embedding store: a private flat index plus the chunk text
/// for every row, sharing the process-wide embedder.
pub struct EmbeddingStore {
    embedder: Arc<dyn Embedder>,
    index: FlatL2Index,
    texts: Vec<String>,
}

impl EmbeddingStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        let index = FlatL2Index::new(embedder.dim());
        Self { embedder, index, texts: Vec::new() }
    }

    pub fn len(&self) -> usize { self.texts.len() }

    pub fn is_empty(&self) -> bool { self.texts.is_empty() }

    /// Embed and append `texts`. Either every text is added or, on
    /// `Error::Embedding`, the store is left exactly as it was.
    pub fn add_texts(&mut self, texts: &[String]) -> Result<()> {
        if texts.is_empty() {
            tracing::debug!("no texts provided to add_texts; skipping");
            return Ok(());
        }
        let embeddings = self.embedder.embed_batch(texts).map_err(|e| {
            tracing::error!(error = %format!("{e:#}"), "error creating embeddings");
            Error::embedding(&e)
        })?;
        if embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "embedder returned {} vectors for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }
        self.index.add(&embeddings).map_err(|e| Error::embedding(&e))?;
        self.texts.extend_from_slice(texts);
        debug_assert_eq!(self.index.len(), self.texts.len());
        tracing::debug!(added = texts.len(), total = self.texts.len(), "added texts to the index");
        Ok(())
    }

    /// Nearest chunks to `query`, closest first, at most `top_k`.
    ///
    /// Never fails: an empty store, an embedding error or an index error all
    /// produce an empty result so the analysis can still proceed.
    pub fn search(&self, query: &str, top_k: NonZeroUsize) -> Vec<ScoredChunk> {
        if self.is_empty() {
            tracing::debug!("index is empty; returning no results");
            return Vec::new();
        }
        match self.try_search(query, top_k.get()) {
            Ok(hits) => {
                tracing::debug!(results = hits.len(), query, "search finished");
                hits
            }
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), query, "vector search failed");
                Vec::new()
            }
        }
    }

    fn try_search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<ScoredChunk>> {
        let mut embedded = self.embedder.embed_batch(&[query.to_string()])?;
        ensure!(embedded.len() == 1, "expected one query embedding, got {}", embedded.len());
        let query_vec = embedded.swap_remove(0);
        let hits = self.index.search(&query_vec, top_k)?;
        Ok(hits
            .into_iter()
            .filter_map(|(pos, distance)| {
                self.texts.get(pos).map(|text| ScoredChunk { text: text.clone(), distance })
            })
            .collect())
    }
}
