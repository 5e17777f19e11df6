use std::path::Path;

use docinsight_core::error::Result;
use docinsight_core::loader::load_document;
use docinsight_core::types::AnalysisReport;

use crate::insight::{generate_full_text_insights, generate_insights, InsightGenerator};
use crate::retrieval::RetrievalPipeline;

/// Load -> retrieve -> generate for one document.
pub struct DocumentAnalyzer {
    pipeline: RetrievalPipeline,
    generator: Box<dyn InsightGenerator>,
}

impl DocumentAnalyzer {
    pub fn new(pipeline: RetrievalPipeline, generator: Box<dyn InsightGenerator>) -> Self {
        Self { pipeline, generator }
    }

    pub fn analyze_file(&self, path: &Path) -> Result<AnalysisReport> {
        let text = load_document(path)?;
        let filename = path.file_name().map(|n| n.to_string_lossy().to_string());
        tracing::info!(file = ?filename, length = text.len(), "analyzing document");
        let mut report = self.analyze_text(&text)?;
        report.filename = filename;
        Ok(report)
    }

    pub fn analyze_text(&self, text: &str) -> Result<AnalysisReport> {
        let retrieval = self.pipeline.retrieve(text)?;
        let num_chunks = retrieval.num_chunks;
        let retrieved = retrieval.into_texts();
        let insights = generate_insights(self.generator.as_ref(), &retrieved)?;
        Ok(AnalysisReport { filename: None, num_chunks, retrieved, insights })
    }

    /// Skip retrieval and ask the model about the entire text. The report
    /// carries no chunks.
    pub fn analyze_full_text(&self, text: &str) -> Result<AnalysisReport> {
        let insights = generate_full_text_insights(self.generator.as_ref(), text)?;
        Ok(AnalysisReport { filename: None, num_chunks: 0, retrieved: Vec::new(), insights })
    }
}
