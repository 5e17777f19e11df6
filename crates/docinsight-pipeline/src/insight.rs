//! Boundary to the generative model that turns retrieved excerpts into the
//! structured analysis. The model itself is opaque: prompt in, text out.

use docinsight_core::error::{Error, Result};

pub const NO_RELEVANT_CONTENT: &str = "No relevant content found.";

/// Trait implemented by concrete LLM backends.
pub trait InsightGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

pub fn build_prompt(chunks: &[String]) -> String {
    let excerpts = chunks.join("\n\n");
    format!(
        "You are a professional document analyst.\n\
         \n\
         Analyze the following document excerpts and provide structured output:\n\
         \n\
         1. Executive Summary (3-4 lines)\n\
         2. Key Insights (bullet points)\n\
         3. Risks / Issues (if any)\n\
         4. Actionable Recommendations\n\
         \n\
         Document Excerpts:\n\
         {excerpts}\n"
    )
}

/// Prompt for analyzing a whole document without retrieval.
pub fn build_full_text_prompt(text: &str) -> String {
    format!(
        "You are an expert document analyst.\n\
         \n\
         Analyze the document and return:\n\
         1. Summary\n\
         2. Key points\n\
         3. Risks (if any)\n\
         4. Recommendations\n\
         \n\
         Document:\n\
         {text}\n"
    )
}

/// Run the generator over the retrieved chunks.
///
/// With no chunks the generator is not called and `NO_RELEVANT_CONTENT` is
/// returned. Generator errors and blank answers become `Error::Generation`.
pub fn generate_insights(generator: &dyn InsightGenerator, chunks: &[String]) -> Result<String> {
    if chunks.is_empty() {
        return Ok(NO_RELEVANT_CONTENT.to_string());
    }
    let prompt = build_prompt(chunks);
    tracing::debug!(chunks = chunks.len(), prompt_len = prompt.len(), "requesting insights");
    run_generator(generator, &prompt)
}

/// Ask the model about an entire document, no retrieval involved.
///
/// Blank text is an `Error::Input` and never reaches the model.
pub fn generate_full_text_insights(generator: &dyn InsightGenerator, text: &str) -> Result<String> {
    if text.trim().is_empty() {
        return Err(Error::Input("document is empty or contained no text".into()));
    }
    let prompt = build_full_text_prompt(text);
    tracing::debug!(prompt_len = prompt.len(), "requesting whole-document analysis");
    run_generator(generator, &prompt)
}

fn run_generator(generator: &dyn InsightGenerator, prompt: &str) -> Result<String> {
    let text = generator.generate(prompt).map_err(|e| {
        tracing::error!(error = %format!("{e:#}"), "failed to generate insights");
        Error::generation(&e)
    })?;
    if text.trim().is_empty() {
        tracing::warn!("generator returned empty content");
        return Err(Error::Generation("No insights were generated".into()));
    }
    tracing::debug!(length = text.len(), "generated insights");
    Ok(text)
}
