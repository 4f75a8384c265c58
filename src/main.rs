// src/main.rs
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use log::{info, warn};
use uuid::Uuid;

use price_matching_lib::{
    catalog::load_products,
    collectors::{CandidateSource, SnapshotSource},
    config::MatcherConfig,
    matching::{manager::run_price_matching_pipeline, shared_scorer, MatchEngine, PipelineOptions},
    models::Platform,
    persistence::write_outputs,
    utils::{env::load_env, progress_config::ProgressConfig},
};

#[derive(Parser)]
#[command(author, version, about = "Match catalog products against platform listings and record prices", long_about = None)]
struct Args {
    /// Clean product master CSV (needs `name` and `sku` columns)
    #[arg(default_value = "data/master/product_master_clean.csv")]
    products: PathBuf,

    /// JSON snapshot of platform listings keyed by sku, product name or search phrase
    #[arg(long)]
    candidates: Option<PathBuf>,

    /// Platforms to check, comma separated (overrides PLATFORMS)
    #[arg(long, value_delimiter = ',')]
    platforms: Option<Vec<Platform>>,

    /// Minimum similarity for a match, in [0, 1] (overrides SIMILARITY_THRESHOLD)
    #[arg(long)]
    similarity_threshold: Option<f64>,

    /// Full matcher configuration as JSON; environment overrides are not applied on top
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base directory for raw/ and processed/ outputs
    #[arg(long, default_value = "data")]
    output_dir: PathBuf,

    /// Skip the sentence-embedding model and score lexically
    #[arg(long)]
    no_embeddings: bool,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    load_env();
    let args = Args::parse();

    let run_id = Uuid::new_v4().to_string();
    let run_timestamp = Utc::now();
    let start_time = Instant::now();
    info!("Starting price matching run {}", run_id);

    let mut config = match &args.config {
        Some(path) => MatcherConfig::from_json_file(path)?,
        None => MatcherConfig::from_env(),
    };
    if let Some(platforms) = args.platforms.clone() {
        config.platforms = platforms;
    }
    if let Some(threshold) = args.similarity_threshold {
        config.similarity_threshold = threshold;
    }
    if args.no_embeddings {
        config.embedding.enabled = false;
    }
    config.validate().context("Invalid matcher configuration")?;
    config.log_config();

    let progress_config = ProgressConfig::from_env();
    info!(
        "Progress tracking: enabled={}, detailed={}",
        progress_config.enabled, progress_config.detailed
    );
    let multi_progress = progress_config.create_multi_progress();

    let products = load_products(&args.products).context("Failed to load products")?;
    if products.is_empty() {
        warn!("No products to match in {}", args.products.display());
    }

    let source: Arc<dyn CandidateSource> = match &args.candidates {
        Some(path) => Arc::new(SnapshotSource::from_json_file(path)?),
        None => {
            warn!("No --candidates snapshot given; every product will be recorded as no_candidates");
            Arc::new(SnapshotSource::default())
        }
    };

    // Resolve the scoring strategy (and load the model) before any fetching starts.
    let scorer = shared_scorer(&config.embedding);
    let method = {
        let scorer = Arc::clone(&scorer);
        tokio::task::spawn_blocking(move || scorer.method())
            .await
            .context("Scorer initialization task failed")?
    };
    info!("Similarity scoring method: {}", method);

    let platforms = config.platforms.clone();
    let engine = Arc::new(MatchEngine::new(config, scorer)?);
    let options = PipelineOptions {
        detailed_progress: progress_config.should_show_detailed(),
        ..Default::default()
    };

    let (records, mut stats) =
        run_price_matching_pipeline(source, engine, &products, &platforms, options, multi_progress)
            .await
            .context("Price matching pipeline failed")?;

    let paths = write_outputs(&args.output_dir, run_timestamp, &records)
        .context("Failed to write price records")?;

    stats.processing_time = start_time.elapsed();
    stats.log_summary();
    info!(
        "Run {} finished: {} records in {} / {}",
        run_id,
        records.len(),
        paths.json.display(),
        paths.csv.display()
    );

    Ok(())
}
