/// A text embedding model shared read-only across analyses.
///
/// Implementations take `&self` for encoding and must be safe to call from
/// several threads at once; one instance is loaded per process and handed to
/// every store behind an `Arc`.
pub trait Embedder: Send + Sync {
    /// Output dimensionality.
    fn dim(&self) -> usize;
    /// Embed a batch, one vector per input, same order.
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}
