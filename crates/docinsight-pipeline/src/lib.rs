//! docinsight-pipeline
//!
//! Composes the core pieces into the document analysis flow: `retrieval`
//! picks the chunks most relevant to the configured query, `insight` hands
//! them to a generative model, `analyzer` runs both for a file or text, or
//! sends a whole document to the model without retrieval.

pub mod analyzer;
pub mod gemini;
pub mod insight;
pub mod retrieval;

pub use analyzer::DocumentAnalyzer;
pub use gemini::GeminiGenerator;
pub use insight::{
    build_full_text_prompt, build_prompt, generate_full_text_insights, generate_insights,
    InsightGenerator, NO_RELEVANT_CONTENT,
};
pub use retrieval::RetrievalPipeline;
