// src/collectors/snapshot.rs
// Candidate source backed by a recorded JSON snapshot of platform search results.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};

use crate::collectors::search_terms::search_keywords;
use crate::collectors::CandidateSource;
use crate::models::{Candidate, Platform, ProductQuery, RawListing};

/// Listings keyed by product sku, product name or search phrase. Each key maps
/// to the raw listings of every platform, in result order.
#[derive(Debug, Default, Clone)]
pub struct SnapshotSource {
    listings: HashMap<String, Vec<RawListing>>,
}

impl SnapshotSource {
    pub fn new(listings: HashMap<String, Vec<RawListing>>) -> Self {
        Self { listings }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read candidate snapshot {}", path.display()))?;
        let listings: HashMap<String, Vec<RawListing>> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse candidate snapshot {}", path.display()))?;
        info!(
            "Loaded candidate snapshot with {} entries ({} listings) from {}",
            listings.len(),
            listings.values().map(Vec::len).sum::<usize>(),
            path.display()
        );
        Ok(Self::new(listings))
    }

    fn lookup(&self, query: &ProductQuery) -> Option<&Vec<RawListing>> {
        query
            .sku
            .as_deref()
            .and_then(|sku| self.listings.get(sku))
            .or_else(|| self.listings.get(&query.name))
            .or_else(|| self.listings.get(&search_keywords(&query.name)))
    }
}

#[async_trait]
impl CandidateSource for SnapshotSource {
    async fn fetch_candidates(&self, query: &ProductQuery, platform: Platform) -> Result<Vec<Candidate>> {
        let Some(listings) = self.lookup(query) else {
            debug!("No snapshot entry for '{}'", query.name);
            return Ok(Vec::new());
        };
        Ok(listings
            .iter()
            .filter(|l| l.platform == platform)
            .cloned()
            .map(Candidate::from_raw)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::io::Write;
    use std::str::FromStr;

    const SNAPSHOT: &str = r#"{
        "SG0001": [
            {"platform": "amazon", "title": "Reiek Peak Wooden Sunglasses - Brown", "price": "₹57.95", "url": "https://www.amazon.in/dp/B0001"},
            {"platform": "myntra", "title": "Wooden Sunglasses", "price": 61, "url": "/sunglasses/reiek/123/buy"},
            {"platform": "amazon", "title": "Sunglasses Case for Reiek Peak", "price": "not listed"}
        ],
        "Silk Stole": [
            {"platform": "flipkart", "title": "Banarasi Silk Stole"}
        ]
    }"#;

    fn source() -> SnapshotSource {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();
        SnapshotSource::from_json_file(file.path()).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_by_sku_filters_platform() {
        let source = source();

        let query = ProductQuery::new("Reiek Peak Wooden Sunglasses").with_sku("SG0001");
        let amazon = source.fetch_candidates(&query, Platform::Amazon).await.unwrap();

        assert_eq!(amazon.len(), 2);
        assert_eq!(amazon[0].title, "Reiek Peak Wooden Sunglasses - Brown");
        assert_eq!(amazon[0].price, Some(Decimal::from_str("57.95").unwrap()));
        assert_eq!(amazon[1].price, None);

        let myntra = source.fetch_candidates(&query, Platform::Myntra).await.unwrap();
        assert_eq!(myntra.len(), 1);
        assert_eq!(myntra[0].price, Some(Decimal::from(61)));
        assert_eq!(
            myntra[0].url.as_deref(),
            Some("https://www.myntra.com/sunglasses/reiek/123/buy")
        );

        assert!(source
            .fetch_candidates(&query, Platform::Flipkart)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_lookup_by_search_phrase() {
        let source = source();
        let query = ProductQuery::new("Banarasi Silk Stole - Maroon").with_sku("ST0042");
        let listings = source.fetch_candidates(&query, Platform::Flipkart).await.unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "Banarasi Silk Stole");
    }

    #[tokio::test]
    async fn test_unknown_product_has_no_candidates() {
        let source = source();
        let query = ProductQuery::new("Brass Diya");
        assert!(source
            .fetch_candidates(&query, Platform::Amazon)
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_malformed_snapshot_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[not json").unwrap();
        assert!(SnapshotSource::from_json_file(file.path()).is_err());
    }
}
