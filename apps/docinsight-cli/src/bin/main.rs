use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use docinsight_core::chunker::{chunk_text, ChunkingConfig};
use docinsight_core::config::{Config, Settings};
use docinsight_core::loader::load_document;
use docinsight_core::types::AnalysisReport;
use docinsight_embed::get_default_embedder;
use docinsight_pipeline::{
    generate_full_text_insights, DocumentAnalyzer, GeminiGenerator, RetrievalPipeline,
};

#[derive(Parser)]
#[command(name = "docinsight")]
#[command(about = "Retrieval-augmented insight extraction for PDF and TXT documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrieve the most relevant chunks and ask the model for insights
    Analyze {
        /// PDF or TXT file to analyze
        file: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Send the whole document to the model instead of retrieved chunks
        #[arg(long, conflicts_with_all = ["top_k", "query"])]
        full_text: bool,
        #[command(flatten)]
        retrieval: RetrievalArgs,
    },
    /// Show the ranked chunks with distances, without calling the model
    Retrieve {
        file: PathBuf,
        #[command(flatten)]
        retrieval: RetrievalArgs,
    },
    /// Print the chunks a document splits into
    Chunk {
        file: PathBuf,
        #[arg(long)]
        chunk_size: Option<usize>,
        #[arg(long)]
        overlap: Option<usize>,
    },
}

#[derive(clap::Args)]
struct RetrievalArgs {
    /// Number of chunks to keep
    #[arg(long)]
    top_k: Option<usize>,
    /// Retrieval query, defaults to the configured one
    #[arg(long)]
    query: Option<String>,
}

impl RetrievalArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(k) = self.top_k {
            settings.retrieval.top_k = k;
        }
        if let Some(q) = &self.query {
            settings.retrieval.query = q.clone();
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = Config::load()?.settings()?;

    match cli.command {
        Commands::Analyze { file, json, full_text, retrieval } => {
            retrieval.apply(&mut settings);
            let report = if full_text {
                analyze_full_text(&file, &settings)?
            } else {
                analyze(&file, &settings)?
            };
            print_report(&report, json)?;
        }
        Commands::Retrieve { file, retrieval } => {
            retrieval.apply(&mut settings);
            retrieve(&file, &settings)?;
        }
        Commands::Chunk { file, chunk_size, overlap } => {
            let chunking = ChunkingConfig::new(
                chunk_size.unwrap_or(settings.chunking.chunk_size),
                overlap.unwrap_or(settings.chunking.overlap),
            )?;
            let text = load_document(&file)?;
            for (i, chunk) in chunk_text(&text, &chunking)?.iter().enumerate() {
                println!("[{i}] ({} chars) {chunk}", chunk.chars().count());
            }
        }
    }
    Ok(())
}

fn build_pipeline(settings: &Settings) -> anyhow::Result<RetrievalPipeline> {
    let embedder = get_default_embedder(&settings.embedding).context("loading embedding model")?;
    Ok(RetrievalPipeline::new(embedder, settings.chunking, settings.retrieval.clone())?)
}

fn analyze(file: &Path, settings: &Settings) -> anyhow::Result<AnalysisReport> {
    // fail on a missing key before paying for the model load
    let generator = GeminiGenerator::from_env(&settings.insight)?;
    let analyzer = DocumentAnalyzer::new(build_pipeline(settings)?, Box::new(generator));
    Ok(analyzer.analyze_file(file)?)
}

/// Whole-document mode; no embedding model is loaded.
fn analyze_full_text(file: &Path, settings: &Settings) -> anyhow::Result<AnalysisReport> {
    let generator = GeminiGenerator::from_env(&settings.insight)?;
    let text = load_document(file)?;
    let insights = generate_full_text_insights(&generator, &text)?;
    Ok(AnalysisReport {
        filename: file.file_name().map(|n| n.to_string_lossy().to_string()),
        num_chunks: 0,
        retrieved: Vec::new(),
        insights,
    })
}

fn print_report(report: &AnalysisReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    let name = report.filename.as_deref().unwrap_or("document");
    if report.num_chunks > 0 {
        println!("📄 {name} ({} chunks)\n", report.num_chunks);
    } else {
        println!("📄 {name} (whole document)\n");
    }
    println!("{}", report.insights);
    Ok(())
}

fn retrieve(file: &Path, settings: &Settings) -> anyhow::Result<()> {
    let pipeline = build_pipeline(settings)?;
    let text = load_document(file)?;
    let retrieval = pipeline.retrieve(&text)?;
    println!(
        "🔍 \"{}\" -> {} of {} chunks",
        pipeline.query(),
        retrieval.hits.len(),
        retrieval.num_chunks
    );
    for (i, hit) in retrieval.hits.iter().enumerate() {
        println!("\n  {}. distance={:.4}", i + 1, hit.distance);
        println!("     {}", hit.text);
    }
    Ok(())
}
