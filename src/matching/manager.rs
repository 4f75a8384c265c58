// src/matching/manager.rs
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::future::join_all;
use indicatif::MultiProgress;
use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::collectors::CandidateSource;
use crate::matching::aggregate::ResultAggregator;
use crate::matching::decision::MatchEngine;
use crate::models::{MatchDecision, MatchingStats, Platform, PriceRecord, ProductQuery};
use crate::utils::progress_config::pair_progress_bar;

static MAX_CONCURRENT_FETCHES: Lazy<usize> = Lazy::new(|| {
    std::env::var("MAX_CONCURRENT_FETCHES")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or_else(|| num_cpus::get().min(8)) // Cap at 8; platforms rate-limit aggressive clients
});
const FETCH_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Upper bound on in-flight `fetch_candidates` calls.
    pub max_concurrent_fetches: usize,
    /// Per-fetch limit; a fetch that exceeds it counts as a failure with no candidates.
    pub fetch_timeout: Duration,
    /// Put the per-pair outcome in the progress bar message.
    pub detailed_progress: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: *MAX_CONCURRENT_FETCHES,
            fetch_timeout: FETCH_TIMEOUT,
            detailed_progress: false,
        }
    }
}

struct PairOutcome {
    platform: Platform,
    decision: MatchDecision,
    fetch_failed: bool,
    decision_failed: bool,
}

/// Fetches and decides every (product, platform) pair concurrently. Records come
/// back in product order, then platform order, one per pair, whatever happened.
pub async fn run_price_matching_pipeline(
    source: Arc<dyn CandidateSource>,
    engine: Arc<MatchEngine>,
    products: &[ProductQuery],
    platforms: &[Platform],
    options: PipelineOptions,
    multi_progress: Option<MultiProgress>,
) -> Result<(Vec<PriceRecord>, MatchingStats)> {
    let start_time = Instant::now();
    let total_pairs = products.len() * platforms.len();
    info!(
        "Matching {} products across {} platforms ({} pairs, {} concurrent fetches, scorer: {})",
        products.len(),
        platforms.len(),
        total_pairs,
        options.max_concurrent_fetches,
        engine.scorer().method()
    );

    let semaphore = Arc::new(Semaphore::new(options.max_concurrent_fetches.max(1)));
    let pb = Arc::new(pair_progress_bar(multi_progress.as_ref(), total_pairs as u64));
    pb.set_message("Matching products...");

    let mut handles: Vec<JoinHandle<PairOutcome>> = Vec::with_capacity(total_pairs);
    for product in products {
        for &platform in platforms {
            let source = Arc::clone(&source);
            let engine = Arc::clone(&engine);
            let semaphore = Arc::clone(&semaphore);
            let pb = Arc::clone(&pb);
            let product = product.clone();
            let fetch_timeout = options.fetch_timeout;
            let detailed = options.detailed_progress;

            handles.push(tokio::spawn(async move {
                let fetched = match semaphore.acquire().await {
                    Ok(_permit) => {
                        match timeout(fetch_timeout, source.fetch_candidates(&product, platform)).await {
                            Ok(Ok(candidates)) => Some(candidates),
                            Ok(Err(e)) => {
                                warn!("Fetching '{}' on {} failed: {:#}", product.name, platform, e);
                                None
                            }
                            Err(_) => {
                                warn!(
                                    "Fetching '{}' on {} timed out after {:?}",
                                    product.name, platform, fetch_timeout
                                );
                                None
                            }
                        }
                    }
                    Err(_) => {
                        error!("Fetch semaphore closed");
                        None
                    }
                };
                let fetch_failed = fetched.is_none();
                let candidates = fetched.unwrap_or_default();
                debug!(
                    "{} candidates for '{}' on {}",
                    candidates.len(),
                    product.name,
                    platform
                );

                // Scoring may run a model forward pass; keep it off the async workers.
                let query = product.clone();
                let (decision, decision_failed) =
                    match tokio::task::spawn_blocking(move || engine.decide(&query, &candidates)).await {
                        Ok(decision) => (decision, false),
                        Err(e) => {
                            error!(
                                "Decision task for '{}' on {} failed, recording it undecided: {}",
                                product.name, platform, e
                            );
                            (MatchDecision::no_candidates(), true)
                        }
                    };

                if detailed {
                    pb.set_message(format!("{} @ {}: {}", product.name, platform, decision.reason));
                }
                pb.inc(1);

                PairOutcome {
                    platform,
                    decision,
                    fetch_failed,
                    decision_failed,
                }
            }));
        }
    }

    let mut aggregator = ResultAggregator::new();
    let mut stats = MatchingStats {
        products_processed: products.len(),
        ..Default::default()
    };

    // join_all keeps spawn order, so output order does not depend on scheduling.
    let pair_keys = products
        .iter()
        .flat_map(|product| platforms.iter().map(move |&platform| (product, platform)));
    for ((product, platform), joined) in pair_keys.zip(join_all(handles).await) {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Pair task for '{}' on {} failed (JoinError): {}", product.name, platform, e);
                PairOutcome {
                    platform,
                    decision: MatchDecision::no_candidates(),
                    fetch_failed: false,
                    decision_failed: true,
                }
            }
        };
        if outcome.fetch_failed {
            stats.fetch_failures += 1;
        }
        if outcome.decision_failed {
            stats.decision_failures += 1;
        }
        stats.record_decision(outcome.platform, &outcome.decision);
        aggregator.push(product, outcome.platform, &outcome.decision);
    }

    pb.finish_with_message(format!(
        "Matching complete: {}/{} pairs matched",
        stats.accepted(),
        total_pairs
    ));

    stats.processing_time = start_time.elapsed();
    Ok((aggregator.into_records(), stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatcherConfig;
    use crate::matching::scorer::{SimilarityScorer, TextEmbedder};
    use crate::models::{Candidate, MatchReason};
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    struct FakeSource;

    #[async_trait]
    impl CandidateSource for FakeSource {
        async fn fetch_candidates(&self, query: &ProductQuery, platform: Platform) -> Result<Vec<Candidate>> {
            match (query.name.as_str(), platform) {
                ("Reiek Peak Wooden Sunglasses", Platform::Amazon) => Ok(vec![
                    Candidate::new(platform, "Reiek Peak Wooden Sunglasses - Brown")
                        .with_price(Decimal::new(5795, 2)),
                    Candidate::new(platform, "Sunglasses Case for Reiek Peak")
                        .with_price(Decimal::new(999, 2)),
                ]),
                ("Reiek Peak Wooden Sunglasses", Platform::Flipkart) => {
                    Err(anyhow::anyhow!("search page blocked"))
                }
                ("Steel Thermos", Platform::Amazon) => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(vec![Candidate::new(platform, "Steel Thermos")])
                }
                ("Steel Thermos", Platform::Flipkart) => {
                    Ok(vec![Candidate::new(platform, "Steel Thermos Cover")])
                }
                _ => Ok(Vec::new()),
            }
        }
    }

    fn engine() -> Arc<MatchEngine> {
        Arc::new(MatchEngine::new(MatcherConfig::default(), Arc::new(SimilarityScorer::lexical())).unwrap())
    }

    #[tokio::test]
    async fn test_pipeline_emits_one_record_per_pair_in_order() {
        let products = vec![
            ProductQuery::new("Reiek Peak Wooden Sunglasses").with_sku("SG0001"),
            ProductQuery::new("Steel Thermos").with_sku("TH0002"),
        ];
        let platforms = [Platform::Amazon, Platform::Flipkart];
        let options = PipelineOptions {
            max_concurrent_fetches: 2,
            fetch_timeout: Duration::from_millis(200),
            detailed_progress: true,
        };

        let (records, stats) =
            run_price_matching_pipeline(Arc::new(FakeSource), engine(), &products, &platforms, options, None)
                .await
                .unwrap();

        assert_eq!(records.len(), 4);
        let keys: Vec<(Option<&str>, Platform)> = records
            .iter()
            .map(|r| (r.sku.as_deref(), r.platform))
            .collect();
        assert_eq!(
            keys,
            vec![
                (Some("SG0001"), Platform::Amazon),
                (Some("SG0001"), Platform::Flipkart),
                (Some("TH0002"), Platform::Amazon),
                (Some("TH0002"), Platform::Flipkart),
            ]
        );

        assert_eq!(records[0].match_reason, MatchReason::Accepted);
        assert_eq!(records[0].current_price, Some(Decimal::new(5795, 2)));
        // Failed and timed-out fetches still produce a row.
        assert_eq!(records[1].match_reason, MatchReason::NoCandidates);
        assert_eq!(records[2].match_reason, MatchReason::NoCandidates);
        assert_eq!(records[3].match_reason, MatchReason::ExcludedTerm);

        assert_eq!(stats.products_processed, 2);
        assert_eq!(stats.pairs_checked, 4);
        assert_eq!(stats.fetch_failures, 2);
        assert_eq!(stats.decision_failures, 0);
        assert_eq!(stats.accepted(), 1);
        assert_eq!(stats.rejected(), 3);
        assert_eq!(stats.matches_by_platform.get(&Platform::Amazon), Some(&1));
    }

    #[tokio::test]
    async fn test_pipeline_with_no_products() {
        let (records, stats) = run_price_matching_pipeline(
            Arc::new(FakeSource),
            engine(),
            &[],
            &Platform::ALL,
            PipelineOptions::default(),
            None,
        )
        .await
        .unwrap();
        assert!(records.is_empty());
        assert_eq!(stats.pairs_checked, 0);
    }

    struct PanickingEmbedder;

    impl TextEmbedder for PanickingEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            panic!("model forward pass crashed");
        }
    }

    #[tokio::test]
    async fn test_crashed_decision_is_counted_separately() {
        let engine = Arc::new(
            MatchEngine::new(
                MatcherConfig::default(),
                Arc::new(SimilarityScorer::with_embedder(Arc::new(PanickingEmbedder))),
            )
            .unwrap(),
        );
        let products = vec![ProductQuery::new("Reiek Peak Wooden Sunglasses").with_sku("SG0001")];

        let (records, stats) = run_price_matching_pipeline(
            Arc::new(FakeSource),
            engine,
            &products,
            &[Platform::Amazon],
            PipelineOptions::default(),
            None,
        )
        .await
        .unwrap();

        // The pair still gets a row, but it is not mistaken for a failed fetch.
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sku.as_deref(), Some("SG0001"));
        assert!(records[0].matched_title.is_none());
        assert_eq!(stats.decision_failures, 1);
        assert_eq!(stats.fetch_failures, 0);
        assert_eq!(stats.accepted(), 0);
    }
}
