// src/catalog.rs
// Product master: cleaning the raw export and loading the clean file as match queries.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use csv::{ByteRecord, ReaderBuilder, StringRecord, WriterBuilder};
use log::{info, warn};

use crate::models::product::{non_blank, ProductQuery};
use crate::utils::price::{parse_price, strip_to_number};

const COLUMN_RENAMES: [(&str, &str); 4] = [
    ("product_id", "sku"),
    ("product_name", "name"),
    ("current_price", "current_price_eur"),
    ("unit_cost", "unit_cost_eur"),
];

const PRICE_COLUMNS: [&str; 2] = ["current_price_eur", "unit_cost_eur"];

fn normalize_header(header: &str) -> String {
    let header = header.trim().to_lowercase().replace(' ', "_");
    COLUMN_RENAMES
        .iter()
        .find(|(from, _)| *from == header)
        .map(|(_, to)| to.to_string())
        .unwrap_or(header)
}

// The raw export is mostly Latin-1; fields that are valid UTF-8 are kept as-is.
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn column_index(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

/// Cleans the raw product master at `raw` into `out`: normalized headers,
/// renamed key columns, numeric price columns, rows without a sku dropped and
/// an `ingested_at` stamp. Returns the number of rows written.
pub fn clean_product_master(raw: &Path, out: &Path) -> Result<usize> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(raw)
        .with_context(|| format!("Failed to open raw product master {}", raw.display()))?;

    let mut headers: Vec<String> = reader
        .byte_headers()
        .context("Failed to read product master header")?
        .iter()
        .map(|h| normalize_header(&decode_field(h)))
        .collect();

    let Some(sku_idx) = column_index(&headers, "sku") else {
        bail!("Product master {} has no product_id/sku column", raw.display());
    };
    let price_idxs: Vec<usize> = PRICE_COLUMNS
        .iter()
        .filter_map(|col| column_index(&headers, col))
        .collect();
    let width = headers.len();
    headers.push("ingested_at".to_string());

    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let mut writer = WriterBuilder::new()
        .from_path(out)
        .with_context(|| format!("Failed to create clean product master {}", out.display()))?;
    writer.write_record(&headers)?;

    let ingested_at = Utc::now().to_rfc3339();
    let mut record = ByteRecord::new();
    let (mut written, mut dropped) = (0usize, 0usize);

    while reader
        .read_byte_record(&mut record)
        .context("Failed to read product master row")?
    {
        let mut fields: Vec<String> = record.iter().map(decode_field).collect();
        fields.resize(width, String::new());

        if fields[sku_idx].trim().is_empty() {
            dropped += 1;
            continue;
        }
        for &idx in &price_idxs {
            fields[idx] = strip_to_number(&fields[idx]);
        }
        fields.push(ingested_at.clone());

        writer.write_record(&fields)?;
        written += 1;
    }
    writer.flush()?;

    info!(
        "✅ Cleaned product master written to {} ({} rows, {} without sku dropped)",
        out.display(),
        written,
        dropped
    );
    Ok(written)
}

/// Reads the clean product master. `name` and `sku` columns are required;
/// rows missing either value are skipped.
pub fn load_products(path: &Path) -> Result<Vec<ProductQuery>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open product master {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read product master header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let (Some(name_idx), Some(sku_idx)) = (
        column_index(&headers, "name"),
        column_index(&headers, "sku"),
    ) else {
        bail!(
            "Product master {} must contain columns: name, sku",
            path.display()
        );
    };
    let price_idx = column_index(&headers, "current_price_eur");
    let cost_idx = column_index(&headers, "unit_cost_eur");
    let category_idx = column_index(&headers, "category");

    let field = |record: &StringRecord, idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| non_blank(record.get(i).map(str::to_string)))
    };

    let mut products = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let record = result.with_context(|| format!("Malformed row in {}", path.display()))?;
        let (Some(name), Some(sku)) = (field(&record, Some(name_idx)), field(&record, Some(sku_idx))) else {
            skipped += 1;
            continue;
        };

        let mut product = ProductQuery::new(name).with_sku(sku);
        product.catalog_price = field(&record, price_idx).as_deref().and_then(parse_price);
        product.catalog_cost = field(&record, cost_idx).as_deref().and_then(parse_price);
        product.category_hint = field(&record, category_idx);
        products.push(product);
    }

    if skipped > 0 {
        warn!("Skipped {} product rows without a name or sku", skipped);
    }
    info!("Found {} products in {}", products.len(), path.display());
    Ok(products)
}
