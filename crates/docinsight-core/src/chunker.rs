use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Window parameters for character chunking. Both values count Unicode
/// scalar values, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 500, overlap: 50 }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let cfg = Self { chunk_size, overlap };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Distance between consecutive window starts.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Collapse every whitespace run to one space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Character windows `(start, end)` over already normalized text, before
/// trimming. Consecutive windows share `overlap` characters; together they
/// cover `0..char_count` with no gap.
pub fn chunk_spans(normalized: &str, cfg: &ChunkingConfig) -> Result<Vec<(usize, usize)>> {
    cfg.validate()?;
    let len = normalized.chars().count();
    let stride = cfg.stride();
    let mut spans = Vec::with_capacity(len / stride + 1);
    let mut start = 0;
    while start < len {
        let end = (start + cfg.chunk_size).min(len);
        spans.push((start, end));
        start += stride;
    }
    Ok(spans)
}

/// Split a document into overlapping, whitespace-normalized chunks.
///
/// Rejects `overlap >= chunk_size` instead of looping. Empty input gives an
/// empty vector; input shorter than one window gives exactly one chunk.
pub fn chunk_text(text: &str, cfg: &ChunkingConfig) -> Result<Vec<String>> {
    let normalized = normalize_whitespace(text);
    let spans = chunk_spans(&normalized, cfg)?;

    // byte offset of every char boundary, plus the end
    let bounds: Vec<usize> = normalized
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(normalized.len()))
        .collect();

    let chunks: Vec<String> = spans
        .into_iter()
        .map(|(start, end)| normalized[bounds[start]..bounds[end]].trim())
        .filter(|chunk| !chunk.is_empty())
        .map(str::to_string)
        .collect();
    tracing::debug!(chars = bounds.len() - 1, chunks = chunks.len(), "chunked document");
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_newlines_and_tabs() {
        assert_eq!(normalize_whitespace("  a\n\n b\t\tc  "), "a b c");
    }

    #[test]
    fn stride_is_size_minus_overlap() {
        assert_eq!(ChunkingConfig::default().stride(), 450);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert!(matches!(ChunkingConfig::new(0, 0), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let text = "é".repeat(12);
        let chunks = chunk_text(&text, &ChunkingConfig::new(5, 1).unwrap()).unwrap();
        assert_eq!(chunks, vec!["ééééé", "ééééé", "éééé"]);
    }
}
