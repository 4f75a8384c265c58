// src/models/record.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::matching::MatchReason;
use crate::models::product::Platform;

/// Flat CSV header, in field order.
pub const PRICE_RECORD_HEADER: [&str; 14] = [
    "timestamp",
    "platform",
    "sku",
    "product_name",
    "matched_title",
    "current_price",
    "original_price",
    "discount",
    "stock_status",
    "url",
    "catalog_price",
    "catalog_cost",
    "match_score",
    "match_reason",
];

/// One output row per (product, platform) that was checked. Rejections keep
/// their row with the listing fields empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub timestamp: DateTime<Utc>,
    pub platform: Platform,
    pub sku: Option<String>,
    pub product_name: String,
    pub matched_title: Option<String>,
    pub current_price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub discount: Option<String>,
    pub stock_status: Option<String>,
    pub url: Option<String>,
    pub catalog_price: Option<Decimal>,
    pub catalog_cost: Option<Decimal>,
    pub match_score: f64,
    pub match_reason: MatchReason,
}

impl PriceRecord {
    pub fn is_match(&self) -> bool {
        self.match_reason == MatchReason::Accepted
    }
}
