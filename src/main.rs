//! Code Indexer - Main Entry Point
//!
//! Indexes a source tree into a JSON map of classes, functions and methods.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use code_indexer::ast_engine::LanguageId;
use code_indexer::batch::BatchIndexer;
use code_indexer::types::IndexerConfig;

#[derive(Parser)]
#[command(name = "code-indexer")]
#[command(author, version, about = "Index source structure into JSON", long_about = None)]
struct Cli {
    /// Root directory to index
    root: PathBuf,

    /// Output file [env: INDEX_OUTPUT]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Language to index; repeat for several [env: INDEX_LANGUAGES]
    #[arg(short, long = "language")]
    languages: Vec<LanguageId>,

    /// Files extracted concurrently [env: MAX_CONCURRENT_FILES]
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // LOG_FORMAT=json switches to structured output
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "code_indexer=info".into()),
        ))
        .with(json_logs.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();

    let cli = Cli::parse();
    let mut config = IndexerConfig::from_env();
    if let Some(output) = &cli.output {
        config.output_path = output.display().to_string();
    }
    if !cli.languages.is_empty() {
        config = config.with_languages(cli.languages.clone());
    }
    if let Some(jobs) = cli.jobs {
        config = config.with_concurrency(jobs);
    }
    config.pretty = cli.pretty;

    info!("Starting Code Indexer v{}", env!("CARGO_PKG_VERSION"));
    info!(root = %cli.root.display(), languages = ?config.languages, "Indexing");

    let indexer = BatchIndexer::from_config(&config)?;
    let (index, result) = indexer.index_directory(&cli.root).await?;

    let json = index.to_json(config.pretty)?;
    tokio::fs::write(&config.output_path, json)
        .await
        .with_context(|| format!("Failed to write {}", config.output_path))?;

    info!(
        files = index.len(),
        failed = result.failed_files,
        output = %config.output_path,
        "Index written"
    );

    Ok(())
}
