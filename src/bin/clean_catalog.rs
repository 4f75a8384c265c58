// src/bin/clean_catalog.rs
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use price_matching_lib::catalog::clean_product_master;
use price_matching_lib::utils::env::load_env;

#[derive(Parser)]
#[command(author, version, about = "Clean the raw product master export", long_about = None)]
struct Args {
    /// Raw product master CSV (Latin-1 or UTF-8)
    #[arg(long, default_value = "data/master/product_master_raw.csv")]
    raw: PathBuf,

    /// Where to write the clean product master
    #[arg(long, default_value = "data/master/product_master_clean.csv")]
    out: PathBuf,
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    load_env();
    let args = Args::parse();

    info!("Cleaning product master {}", args.raw.display());
    let rows = clean_product_master(&args.raw, &args.out)
        .with_context(|| format!("Failed to clean {}", args.raw.display()))?;
    info!("{} products ready in {}", rows, args.out.display());
    Ok(())
}
