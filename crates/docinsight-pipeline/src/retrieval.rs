use std::num::NonZeroUsize;
use std::sync::Arc;

use docinsight_core::chunker::{chunk_text, ChunkingConfig};
use docinsight_core::config::RetrievalConfig;
use docinsight_core::error::{Error, Result};
use docinsight_core::traits::Embedder;
use docinsight_core::types::Retrieval;
use docinsight_vector::EmbeddingStore;

/// Chunk -> embed -> search over one document with a fixed query.
///
/// Holds only the shared embedder and validated settings; every call builds
/// and drops its own `EmbeddingStore`.
pub struct RetrievalPipeline {
    embedder: Arc<dyn Embedder>,
    chunking: ChunkingConfig,
    query: String,
    top_k: NonZeroUsize,
}

impl RetrievalPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        chunking: ChunkingConfig,
        retrieval: RetrievalConfig,
    ) -> Result<Self> {
        chunking.validate()?;
        retrieval.validate()?;
        let top_k = retrieval.top_k()?;
        Ok(Self { embedder, chunking, query: retrieval.query, top_k })
    }

    pub fn query(&self) -> &str { &self.query }

    pub fn top_k(&self) -> NonZeroUsize { self.top_k }

    pub fn retrieve(&self, text: &str) -> Result<Retrieval> {
        self.retrieve_with_query(text, &self.query)
    }

    /// Same as `retrieve` but with an explicit query instead of the configured one.
    /// A blank query is rejected like a blank configured one.
    pub fn retrieve_with_query(&self, text: &str, query: &str) -> Result<Retrieval> {
        if query.trim().is_empty() {
            return Err(Error::InvalidConfig("retrieval query must not be empty".into()));
        }
        let chunks = chunk_text(text, &self.chunking)?;
        if chunks.is_empty() {
            tracing::warn!("document produced no chunks");
            return Err(Error::Input("document is empty or contained no text".into()));
        }

        let mut store = EmbeddingStore::new(Arc::clone(&self.embedder));
        store.add_texts(&chunks)?;

        let hits = store.search(query, self.top_k);
        if hits.is_empty() {
            tracing::warn!(chunks = chunks.len(), query, "no relevant chunks retrieved");
        } else {
            tracing::debug!(
                chunks = chunks.len(),
                hits = hits.len(),
                query,
                "retrieval finished"
            );
        }
        Ok(Retrieval { num_chunks: chunks.len(), hits })
    }
}
