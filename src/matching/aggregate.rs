// src/matching/aggregate.rs
use chrono::{DateTime, Utc};

use crate::models::{MatchDecision, Platform, PriceRecord, ProductQuery};

/// Output record for one (product, platform) decision, stamped now.
pub fn aggregate(query: &ProductQuery, platform: Platform, decision: &MatchDecision) -> PriceRecord {
    aggregate_at(query, platform, decision, Utc::now())
}

/// Listing fields are filled only for an accepted decision; rejections keep
/// the query metadata, the score and the reason.
pub fn aggregate_at(
    query: &ProductQuery,
    platform: Platform,
    decision: &MatchDecision,
    timestamp: DateTime<Utc>,
) -> PriceRecord {
    let listing = decision
        .best_candidate
        .as_ref()
        .filter(|_| decision.accepted);

    PriceRecord {
        timestamp,
        platform,
        sku: query.sku.clone(),
        product_name: query.name.clone(),
        matched_title: listing.map(|c| c.title.clone()),
        current_price: listing.and_then(|c| c.price),
        original_price: listing.and_then(|c| c.original_price),
        discount: listing.and_then(|c| c.discount.clone()),
        stock_status: listing.and_then(|c| c.stock_status.clone()),
        url: listing.and_then(|c| c.url.clone()),
        catalog_price: query.catalog_price,
        catalog_cost: query.catalog_cost,
        match_score: decision.score,
        match_reason: decision.reason,
    }
}

/// Collects records in the order they are pushed. No deduplication.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    records: Vec<PriceRecord>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, query: &ProductQuery, platform: Platform, decision: &MatchDecision) -> &PriceRecord {
        self.push_record(aggregate(query, platform, decision))
    }

    pub fn push_record(&mut self, record: PriceRecord) -> &PriceRecord {
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    pub fn into_records(self) -> Vec<PriceRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, MatchReason};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn query() -> ProductQuery {
        ProductQuery::new("Reiek Peak Wooden Sunglasses")
            .with_sku("SG0001")
            .with_catalog_price(dec("49.90"))
            .with_catalog_cost(dec("18.25"))
    }

    #[test]
    fn test_accepted_record() {
        let mut candidate = Candidate::new(Platform::Flipkart, "Reiek Peak Wooden Sunglasses - Brown")
            .with_price(dec("57.95"))
            .with_url("https://www.flipkart.com/p/123");
        candidate.original_price = Some(dec("79.00"));
        candidate.discount = Some("26% off".to_string());

        let decision = MatchDecision {
            accepted: true,
            best_candidate: Some(candidate),
            score: 0.8,
            reason: MatchReason::Accepted,
            ranked: Vec::new(),
        };
        let now = Utc::now();
        let record = aggregate_at(&query(), Platform::Flipkart, &decision, now);

        assert_eq!(record.timestamp, now);
        assert_eq!(record.platform, Platform::Flipkart);
        assert_eq!(record.sku.as_deref(), Some("SG0001"));
        assert_eq!(record.matched_title.as_deref(), Some("Reiek Peak Wooden Sunglasses - Brown"));
        assert_eq!(record.current_price, Some(dec("57.95")));
        assert_eq!(record.original_price, Some(dec("79.00")));
        assert_eq!(record.discount.as_deref(), Some("26% off"));
        assert_eq!(record.url.as_deref(), Some("https://www.flipkart.com/p/123"));
        assert_eq!(record.catalog_price, Some(dec("49.90")));
        assert_eq!(record.catalog_cost, Some(dec("18.25")));
        assert_eq!(record.match_score, 0.8);
        assert!(record.is_match());
    }

    #[test]
    fn test_rejected_record_keeps_row() {
        let decision = MatchDecision {
            accepted: false,
            best_candidate: None,
            score: 0.4,
            reason: MatchReason::BelowThreshold,
            ranked: Vec::new(),
        };
        let record = aggregate(&query(), Platform::Myntra, &decision);

        assert!(!record.is_match());
        assert_eq!(record.match_reason, MatchReason::BelowThreshold);
        assert_eq!(record.match_score, 0.4);
        assert_eq!(record.product_name, "Reiek Peak Wooden Sunglasses");
        assert_eq!(record.catalog_price, Some(dec("49.90")));
        assert!(record.matched_title.is_none());
        assert!(record.current_price.is_none());
        assert!(record.url.is_none());
    }

    #[test]
    fn test_aggregator_keeps_call_order() {
        let mut aggregator = ResultAggregator::new();
        let none = MatchDecision::no_candidates();
        aggregator.push(&query(), Platform::Amazon, &none);
        aggregator.push(&query(), Platform::Flipkart, &none);
        aggregator.push(&query(), Platform::Amazon, &none);

        let records = aggregator.into_records();
        let platforms: Vec<Platform> = records.iter().map(|r| r.platform).collect();
        assert_eq!(platforms, vec![Platform::Amazon, Platform::Flipkart, Platform::Amazon]);
        assert!(records.iter().all(|r| r.match_reason == MatchReason::NoCandidates));
    }
}
