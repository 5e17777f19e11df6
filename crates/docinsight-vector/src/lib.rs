//! docinsight-vector
//!
//! In-memory vector search for a single document: `FlatL2Index` does exact
//! squared-L2 nearest-neighbour lookup, `EmbeddingStore` pairs it with the
//! chunk texts and the shared embedder. Nothing here is persisted.

pub mod index;
pub mod store;

pub use index::FlatL2Index;
pub use store::EmbeddingStore;
