//! Document loading: turns a TXT or PDF file on disk into document text.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Txt,
}

impl DocumentKind {
    /// Detect by extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("txt") => Ok(Self::Txt),
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }
}

pub fn load_document(path: &Path) -> Result<String> {
    let kind = DocumentKind::from_path(path)?;
    if !path.exists() {
        return Err(Error::NotFound(path.display().to_string()));
    }
    let text = match kind {
        DocumentKind::Txt => load_txt(path)?,
        DocumentKind::Pdf => load_pdf(path)?,
    };
    tracing::debug!(path = %path.display(), ?kind, length = text.len(), "loaded document");
    Ok(text)
}

/// Reads UTF-8 text, silently dropping invalid byte sequences.
fn load_txt(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| load_error(path, e))?;
    Ok(decode_utf8_dropping_invalid(&bytes))
}

fn load_pdf(path: &Path) -> Result<String> {
    pdf_extract::extract_text(path).map_err(|e| load_error(path, e))
}

fn load_error(path: &Path, reason: impl std::fmt::Display) -> Error {
    Error::Load { path: path.display().to_string(), reason: reason.to_string() }
}

fn decode_utf8_dropping_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}
