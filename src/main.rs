//! ELERAG - Main CLI Entry Point

use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use elerag::{
    cli::{Args, Commands, IngestArgs, QueryArgs, Verbosity},
    config::Config,
    generation::{build_prompt, clean_answer, EvidenceReport, LlamaCliGenerator},
    ingest::{IngestReport, Ingestor},
    kb::WikidataClient,
    memory::{Embedder, EmbeddingEngine, MemoryStore},
    nlp::HeuristicAnalyzer,
    rag::{Passage, RagPipeline},
    RagError, Result,
};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbosity());

    if let Err(err) = run(&args).await {
        report_error(&err);
        std::process::exit(err.exit_code());
    }
}

fn init_tracing(verbosity: Verbosity) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false),
        )
        .init();
}

async fn run(args: &Args) -> Result<()> {
    let config = Config::load(args.config.as_deref(), args.profile)?;

    match &args.command {
        Commands::Ingest(ingest) => run_ingest(&config, ingest, args.verbosity()).await,
        Commands::Query(query) => run_query(&config, query, args.verbosity()).await,
        Commands::Config => show_config(&config),
    }
}

fn load_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let engine: Arc<dyn Embedder> = Arc::new(EmbeddingEngine::from_hub(&config.embedding.model_id)?);
    Ok(engine)
}

async fn run_ingest(config: &Config, ingest: &IngestArgs, verbosity: Verbosity) -> Result<()> {
    let embedder = load_embedder(config)?;
    let kb = Arc::new(WikidataClient::from_config(&config.entities)?);

    if verbosity.show_progress() {
        println!("{} {}", "Reading".cyan().bold(), ingest.path.display());
    }

    let report = Ingestor::new(config.clone(), Arc::new(HeuristicAnalyzer::new()), kb, embedder)
        .with_progress(verbosity.show_progress())
        .ingest(&ingest.path, ingest.source_mode())
        .await?;

    print_ingest_summary(&report);
    Ok(())
}

fn print_ingest_summary(report: &IngestReport) {
    println!("{}", "Ingestion complete".green().bold());
    println!("  Chunks:               {}", report.chunks);
    if report.entities_enabled {
        println!("  Chunks with entities: {}", report.chunks_with_entities);
    } else {
        println!("  Entity linking:       {}", "skipped (corpus too large)".yellow());
    }
    if report.load.duplicates > 0 || report.load.too_short > 0 {
        println!(
            "  Dropped:              {} duplicate, {} too short",
            report.load.duplicates, report.load.too_short
        );
    }
    println!("  Memory:               {}", report.memory_path.display());
}

async fn run_query(config: &Config, query: &QueryArgs, verbosity: Verbosity) -> Result<()> {
    let store = MemoryStore::new(config.memory_path());
    if !store.exists() {
        return Err(RagError::MissingMemory {
            path: store.path().to_path_buf(),
        });
    }

    let question = query.question_text();
    let embedder = load_embedder(config)?;
    let kb = Arc::new(WikidataClient::from_config(&config.entities)?);
    let mut pipeline = RagPipeline::open(config, Arc::new(HeuristicAnalyzer::new()), kb, embedder)?;

    if verbosity.show_progress() {
        println!("{}", "Thinking...".cyan());
    }
    let passages = pipeline.query(&question).await?;
    print_passages(&passages);

    let report = config.report_path().map(EvidenceReport::new);
    if let Some(report) = &report {
        report.write(&question, &passages)?;
        println!("{} {}", "Evidence saved to".dimmed(), report.path().display());
    }

    if query.passages_only {
        return Ok(());
    }
    if passages.is_empty() {
        println!("{}", "No passages retrieved; nothing to answer from.".yellow());
        return Ok(());
    }

    let prompt = build_prompt(config.profile, &question, &passages);
    let output = LlamaCliGenerator::new(&config.generator).generate(&prompt).await?;
    let answer = clean_answer(&output)?;

    println!("\n{}", "--- Answer ---".green().bold());
    println!("{}", answer);
    println!("{}\n", "--------------".green().bold());

    if let Some(report) = &report {
        report.append_summary(&answer)?;
    }
    Ok(())
}

fn print_passages(passages: &[Passage]) {
    for (rank, passage) in passages.iter().enumerate() {
        let snippet: String = passage.text.chars().take(200).collect();
        println!(
            "{} {} {}",
            format!("[{}]", rank + 1).bold(),
            format!("(id {}, score {:.4})", passage.id, passage.score).dimmed(),
            snippet.replace('\n', " ")
        );
    }
}

fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.to_toml()?);
    Ok(())
}

fn report_error(err: &RagError) {
    eprintln!("{} {}", "Error:".red().bold(), err);
    if let RagError::ExternalToolFailure { raw } = err {
        println!("{}", raw);
    }
}
