use anyhow::{Context, Result};
use clap::Parser;
use extract::ExtractionStrategy;
use index::{GraphBackend, GraphConfig, GraphStats};
use ingest::DocumentSource;
use pipeline::{Orchestrator, PipelineConfig, RunOptions, RunSummary};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

/// Extract knowledge graph triples from a directory of text files and upsert
/// them into a graph store.
#[derive(Parser, Debug)]
#[command(name = "upload_corpus", version)]
struct Args {
    /// Corpus directory (overrides the config file)
    corpus: Option<PathBuf>,

    /// Only process the first N documents
    max_files: Option<usize>,

    /// TOML config file
    #[arg(long, env = "PIPELINE_CONFIG")]
    config: Option<PathBuf>,

    /// auto, remote, service or heuristic
    #[arg(long)]
    strategy: Option<ExtractionStrategy>,

    /// Force the local heuristic extractor
    #[arg(long, conflicts_with = "strategy")]
    no_remote: bool,

    /// neo4j, service or memory
    #[arg(long)]
    backend: Option<GraphBackend>,

    /// File extension to pick up
    #[arg(long)]
    extension: Option<String>,

    /// Pause between documents in milliseconds
    #[arg(long)]
    throttle_ms: Option<u64>,

    /// Log as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    pipeline::logging::init_tracing(args.log_json);

    match run(args).await {
        Ok(summary) if summary.has_failures() => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Run aborted");
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<RunSummary> {
    let mut config = PipelineConfig::load(args.config.as_deref())?;
    apply_args(&mut config, &args);

    // Corpus problems must surface before any network call.
    let source = DocumentSource::open(&config.corpus)?;

    let extractor = extract::build_extractor(&config.extraction)?;
    let store = index::connect(&config.graph).await?;
    let orchestrator = Orchestrator::new(extractor, store, RunOptions::from(&config));

    print_banner(&config, &source, orchestrator.options());

    let initial = orchestrator
        .prepare()
        .await
        .context("Graph store is not ready")?;

    let summary = orchestrator.run(&source).await;

    let final_stats = match orchestrator.store().stats().await {
        Ok(stats) => Some(stats),
        Err(e) => {
            error!(error = %e, "Could not fetch final graph stats");
            None
        }
    };

    print_report(&summary, initial, final_stats);
    Ok(summary)
}

fn apply_args(config: &mut PipelineConfig, args: &Args) {
    if let Some(corpus) = &args.corpus {
        config.corpus.path = corpus.clone();
    }
    if let Some(max) = args.max_files {
        config.corpus.max_documents = Some(max);
    }
    if let Some(extension) = &args.extension {
        config.corpus.extension = extension.clone();
    }
    if let Some(strategy) = args.strategy {
        config.extraction.strategy = strategy;
    }
    if args.no_remote {
        config.extraction.strategy = ExtractionStrategy::Heuristic;
    }
    if let Some(backend) = args.backend {
        config.graph.backend = backend;
    }
    if let Some(throttle_ms) = args.throttle_ms {
        config.run.throttle_ms = throttle_ms;
    }
}

fn print_banner(config: &PipelineConfig, source: &DocumentSource, options: &RunOptions) {
    println!("{}", "=".repeat(60));
    println!("Corpus upload to graph store");
    println!("{}", "=".repeat(60));
    println!("Corpus path:        {}", source.root().display());
    println!("Documents:          {}", source.len());
    println!("Triple extraction:  {}", config.extraction.resolved_strategy());
    println!("Graph backend:      {}", describe_backend(&config.graph));
    println!("Throttle:           {:?}", options.throttle);
    println!("{}", "=".repeat(60));
}

fn describe_backend(graph: &GraphConfig) -> String {
    match graph.backend {
        GraphBackend::Neo4j => format!("neo4j ({})", graph.uri),
        GraphBackend::Service => format!("service ({})", graph.service_url),
        GraphBackend::Memory => "memory".to_string(),
    }
}

fn print_report(summary: &RunSummary, initial: GraphStats, final_stats: Option<GraphStats>) {
    println!("\n{}", "=".repeat(60));
    println!("Upload complete");
    println!("{}", "=".repeat(60));
    println!("{}", summary);
    println!();
    println!("Graph before: {} nodes, {} relationships", initial.entity_count, initial.relation_count);
    if let Some(stats) = final_stats {
        println!("Graph after:  {} nodes, {} relationships", stats.entity_count, stats.relation_count);
    }
    println!("{}", "=".repeat(60));
}
