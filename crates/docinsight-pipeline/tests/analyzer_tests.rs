use std::fs;
use std::sync::{Arc, Mutex};

use docinsight_core::chunker::ChunkingConfig;
use docinsight_core::config::{RetrievalConfig, DEFAULT_QUERY};
use docinsight_core::traits::Embedder;
use docinsight_core::Error;
use docinsight_embed::FakeEmbedder;
use docinsight_pipeline::{
    build_full_text_prompt, build_prompt, generate_insights, DocumentAnalyzer, InsightGenerator,
    RetrievalPipeline, NO_RELEVANT_CONTENT,
};
use tempfile::TempDir;

/// Records every prompt and answers with a canned reply.
#[derive(Clone, Default)]
struct RecordingGenerator {
    prompts: Arc<Mutex<Vec<String>>>,
    reply: String,
}

impl RecordingGenerator {
    fn replying(reply: &str) -> Self {
        Self { prompts: Arc::default(), reply: reply.to_string() }
    }

    fn calls(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl InsightGenerator for RecordingGenerator {
    fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

struct FailingGenerator;

impl InsightGenerator for FailingGenerator {
    fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("quota exceeded")
    }
}

fn pipeline_with(embedder: Arc<dyn Embedder>) -> RetrievalPipeline {
    RetrievalPipeline::new(
        embedder,
        ChunkingConfig { chunk_size: 60, overlap: 10 },
        RetrievalConfig::default(),
    )
    .expect("pipeline")
}

fn pipeline() -> RetrievalPipeline {
    pipeline_with(Arc::new(FakeEmbedder::new(128)))
}

/// Embeds document chunks but fails whenever the configured query is embedded.
struct QueryBlindEmbedder {
    inner: FakeEmbedder,
}

impl Embedder for QueryBlindEmbedder {
    fn dim(&self) -> usize { self.inner.dim() }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t == DEFAULT_QUERY) {
            anyhow::bail!("query encoder offline");
        }
        self.inner.embed_batch(texts)
    }
}

#[test]
fn prompt_lists_sections_and_excerpts() {
    let prompt = build_prompt(&["first excerpt".to_string(), "second excerpt".to_string()]);
    let sections =
        ["Executive Summary", "Key Insights", "Risks / Issues", "Actionable Recommendations"];
    for section in sections {
        assert!(prompt.contains(section), "missing {section}");
    }
    assert!(prompt.contains("Document Excerpts:\nfirst excerpt\n\nsecond excerpt"));
}

#[test]
fn empty_context_short_circuits_without_calling_the_model() {
    let generator = RecordingGenerator::replying("unused");
    let text = generate_insights(&generator, &[]).expect("insights");
    assert_eq!(text, NO_RELEVANT_CONTENT);
    assert!(generator.calls().is_empty());
}

#[test]
fn blank_model_output_is_a_generation_error() {
    let generator = RecordingGenerator::replying("   \n");
    let err = generate_insights(&generator, &["excerpt".to_string()]).unwrap_err();
    assert!(matches!(err, Error::Generation(_)));
}

#[test]
fn model_failure_is_a_generation_error() {
    match generate_insights(&FailingGenerator, &["excerpt".to_string()]) {
        Err(Error::Generation(msg)) => assert!(msg.contains("quota exceeded")),
        other => panic!("expected generation error, got {other:?}"),
    }
}

#[test]
fn analyze_text_sends_retrieved_chunks_to_the_model() {
    let generator = RecordingGenerator::replying("1. Executive Summary\nAll good.");
    let analyzer = DocumentAnalyzer::new(pipeline(), Box::new(generator.clone()));

    let text = "Revenue grew in every region. Key risks include rising input costs. \
                Insights point to strong demand. Staff parking moves next month.";
    let report = analyzer.analyze_text(text).expect("report");

    assert!(report.filename.is_none());
    assert!(report.num_chunks >= 2);
    assert!(!report.retrieved.is_empty() && report.retrieved.len() <= 5);
    assert_eq!(report.insights, "1. Executive Summary\nAll good.");

    let calls = generator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], build_prompt(&report.retrieved));
}

#[test]
fn analyze_file_reports_filename_and_serializes() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("memo.txt");
    fs::write(&path, "Key insight: churn fell.\n\nRisk: one customer is 40% of revenue.").unwrap();

    let analyzer = DocumentAnalyzer::new(pipeline(), Box::new(RecordingGenerator::replying("ok")));
    let report = analyzer.analyze_file(&path).expect("report");
    assert_eq!(report.filename.as_deref(), Some("memo.txt"));

    let json = serde_json::to_value(&report).expect("json");
    assert_eq!(json["filename"], "memo.txt");
    assert_eq!(json["num_chunks"], report.num_chunks);
    assert_eq!(json["insights"], "ok");
}

#[test]
fn empty_file_is_an_input_error_and_skips_generation() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("blank.txt");
    fs::write(&path, "\n\n   \n").unwrap();

    let generator = RecordingGenerator::replying("unused");
    let analyzer = DocumentAnalyzer::new(pipeline(), Box::new(generator.clone()));
    assert!(matches!(analyzer.analyze_file(&path), Err(Error::Input(_))));
    assert!(generator.calls().is_empty());
}

#[test]
fn generation_failure_surfaces_from_analysis() {
    let analyzer = DocumentAnalyzer::new(pipeline(), Box::new(FailingGenerator));
    assert!(matches!(analyzer.analyze_text("Some risks exist."), Err(Error::Generation(_))));
}

#[test]
fn degraded_retrieval_still_produces_a_report_without_calling_the_model() {
    let generator = RecordingGenerator::replying("unused");
    let pipeline = pipeline_with(Arc::new(QueryBlindEmbedder { inner: FakeEmbedder::new(128) }));
    let analyzer = DocumentAnalyzer::new(pipeline, Box::new(generator.clone()));

    let text = "Revenue grew in every region. Key risks include rising input costs. \
                Insights point to strong demand. Staff parking moves next month.";
    let report = analyzer.analyze_text(text).expect("degraded retrieval is not an error");

    assert!(report.num_chunks >= 2);
    assert!(report.retrieved.is_empty());
    assert_eq!(report.insights, NO_RELEVANT_CONTENT);
    assert!(generator.calls().is_empty());
}

#[test]
fn full_text_prompt_asks_for_the_four_sections() {
    let prompt = build_full_text_prompt("The lease ends in May.");
    assert!(prompt.starts_with("You are an expert document analyst."));
    for section in ["1. Summary", "2. Key points", "3. Risks (if any)", "4. Recommendations"] {
        assert!(prompt.contains(section), "missing {section}");
    }
    assert!(prompt.ends_with("Document:\nThe lease ends in May.\n"));
}

#[test]
fn full_text_analysis_sends_the_whole_document_once() {
    let generator = RecordingGenerator::replying("Summary: lease ends soon.");
    let analyzer = DocumentAnalyzer::new(pipeline(), Box::new(generator.clone()));

    let text = "The lease ends in May. Rent rises 8 percent on renewal. ".repeat(20);
    let report = analyzer.analyze_full_text(&text).expect("report");

    assert_eq!(report.num_chunks, 0);
    assert!(report.retrieved.is_empty());
    assert_eq!(report.insights, "Summary: lease ends soon.");
    assert_eq!(generator.calls(), vec![build_full_text_prompt(&text)]);
}

#[test]
fn full_text_analysis_rejects_blank_text_and_surfaces_failures() {
    let generator = RecordingGenerator::replying("unused");
    let analyzer = DocumentAnalyzer::new(pipeline(), Box::new(generator.clone()));
    assert!(matches!(analyzer.analyze_full_text(" \n\t"), Err(Error::Input(_))));
    assert!(generator.calls().is_empty());

    let failing = DocumentAnalyzer::new(pipeline(), Box::new(FailingGenerator));
    assert!(matches!(failing.analyze_full_text("Some text."), Err(Error::Generation(_))));
}
