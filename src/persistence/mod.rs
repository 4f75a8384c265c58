// src/persistence/mod.rs
// Writing and reading batches of price records: a JSON array under raw/ and a
// flat CSV under processed/, both stamped with the run time.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use log::info;

use crate::models::{PriceRecord, PRICE_RECORD_HEADER};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
}

/// `<base>/raw/price_data_<ts>.json` and `<base>/processed/price_data_<ts>.csv`.
pub fn output_paths(base: &Path, timestamp: DateTime<Utc>) -> OutputPaths {
    let stamp = timestamp.format("%Y%m%d_%H%M%S");
    OutputPaths {
        json: base.join("raw").join(format!("price_data_{}.json", stamp)),
        csv: base.join("processed").join(format!("price_data_{}.csv", stamp)),
    }
}

pub fn ensure_directories(paths: &OutputPaths) -> Result<()> {
    for path in [&paths.json, &paths.csv] {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

pub fn write_json(path: &Path, records: &[PriceRecord]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), records)
        .with_context(|| format!("Failed to write JSON records to {}", path.display()))
}

pub fn read_json(path: &Path) -> Result<Vec<PriceRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse JSON records from {}", path.display()))
}

/// Writes the fixed header even when there are no records.
pub fn write_csv(path: &Path, records: &[PriceRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(PRICE_RECORD_HEADER)?;
    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("Failed to write CSV record to {}", path.display()))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_csv(path: &Path) -> Result<Vec<PriceRecord>> {
    let mut reader = ReaderBuilder::new()
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    reader
        .deserialize()
        .map(|row| row.with_context(|| format!("Malformed CSV record in {}", path.display())))
        .collect()
}

/// Writes the batch in both formats and returns where it went.
pub fn write_outputs(base: &Path, timestamp: DateTime<Utc>, records: &[PriceRecord]) -> Result<OutputPaths> {
    let paths = output_paths(base, timestamp);
    ensure_directories(&paths)?;
    write_json(&paths.json, records)?;
    write_csv(&paths.csv, records)?;
    info!(
        "💾 Saved {} records to {} and {}",
        records.len(),
        paths.json.display(),
        paths.csv.display()
    );
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchReason, Platform};
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn records() -> Vec<PriceRecord> {
        let timestamp = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        vec![
            PriceRecord {
                timestamp,
                platform: Platform::Amazon,
                sku: Some("SG0001".to_string()),
                product_name: "Reiek Peak Wooden Sunglasses".to_string(),
                matched_title: Some("Reiek Peak Wooden Sunglasses - Brown, Polarized".to_string()),
                current_price: Some(Decimal::new(5795, 2)),
                original_price: Some(Decimal::new(7900, 2)),
                discount: Some("26% off".to_string()),
                stock_status: Some("In stock".to_string()),
                url: Some("https://www.amazon.in/dp/B0001".to_string()),
                catalog_price: Some(Decimal::new(4990, 2)),
                catalog_cost: Some(Decimal::new(1825, 2)),
                match_score: 0.8,
                match_reason: MatchReason::Accepted,
            },
            PriceRecord {
                timestamp,
                platform: Platform::Myntra,
                sku: Some("SG0001".to_string()),
                product_name: "Reiek Peak Wooden Sunglasses".to_string(),
                matched_title: None,
                current_price: None,
                original_price: None,
                discount: None,
                stock_status: None,
                url: None,
                catalog_price: Some(Decimal::new(4990, 2)),
                catalog_cost: None,
                match_score: 0.0,
                match_reason: MatchReason::NoCandidates,
            },
        ]
    }

    #[test]
    fn test_output_paths() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 5).unwrap();
        let paths = output_paths(Path::new("data"), ts);
        assert_eq!(paths.json, PathBuf::from("data/raw/price_data_20250314_093005.json"));
        assert_eq!(paths.csv, PathBuf::from("data/processed/price_data_20250314_093005.csv"));
    }

    #[test]
    fn test_json_and_csv_hold_the_same_records() {
        let dir = tempfile::tempdir().unwrap();
        let records = records();
        let paths = write_outputs(dir.path(), Utc::now(), &records).unwrap();

        assert_eq!(read_json(&paths.json).unwrap(), records);
        assert_eq!(read_csv(&paths.csv).unwrap(), records);

        let csv_text = fs::read_to_string(&paths.csv).unwrap();
        let header = csv_text.lines().next().unwrap();
        assert_eq!(header, PRICE_RECORD_HEADER.join(","));
        assert!(csv_text.contains("no_candidates"));
    }

    #[test]
    fn test_empty_batch_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_csv(&path, &[]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap().trim(), PRICE_RECORD_HEADER.join(","));
        assert!(read_csv(&path).unwrap().is_empty());
    }
}
