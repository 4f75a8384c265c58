// src/matching/decision.rs
// Picks the listing, if any, that is the queried product.

use std::cmp::Ordering;
use std::sync::Arc;

use log::debug;

use crate::config::MatcherConfig;
use crate::error::MatchError;
use crate::matching::category::CategoryClassifier;
use crate::matching::normalize::{normalize, parse_keywords, Keyword, NormalizedText};
use crate::matching::scorer::SimilarityScorer;
use crate::models::{Candidate, MatchDecision, MatchMethod, MatchReason, MatchScore, ProductQuery};

// Accessory and derivative terms. A listing containing one the query lacks is
// a product sold alongside the queried one, not the product itself.
pub const DEFAULT_EXCLUSION_TERMS: [&str; 24] = [
    "case",
    "cover",
    "pouch",
    "bag",
    "sleeve",
    "stand",
    "refill",
    "strap",
    "charger",
    "cable",
    "adapter",
    "power bank",
    "cleaner",
    "wipes",
    "cloth",
    "kit",
    "repair",
    "keychain",
    "accessory",
    "accessories",
    "decoration",
    "shirt",
    "clothing",
    "apparel",
];

pub struct MatchEngine {
    config: MatcherConfig,
    classifier: CategoryClassifier,
    exclusions: Vec<Keyword>,
    scorer: Arc<SimilarityScorer>,
}

impl MatchEngine {
    pub fn new(config: MatcherConfig, scorer: Arc<SimilarityScorer>) -> Result<Self, MatchError> {
        config.validate()?;
        Ok(Self {
            classifier: CategoryClassifier::new(&config.categories),
            exclusions: parse_keywords(&config.exclusion_terms),
            config,
            scorer,
        })
    }

    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    /// Decides which of `candidates` (in platform result order) is `query`.
    pub fn decide(&self, query: &ProductQuery, candidates: &[Candidate]) -> MatchDecision {
        if candidates.is_empty() {
            return MatchDecision::no_candidates();
        }

        let query_text = normalize(&query.name);
        let query_category = self
            .classifier
            .classify_query(&query_text, query.category_hint.as_deref());
        // Terms the query itself uses never disqualify a listing.
        let active_exclusions: Vec<&Keyword> = self
            .exclusions
            .iter()
            .filter(|term| !query_text.contains_keyword(term))
            .collect();
        let prepared = self.scorer.prepare(&query_text);

        let titles: Vec<NormalizedText> = candidates.iter().map(|c| normalize(&c.title)).collect();
        let scores: Vec<MatchScore> = candidates
            .iter()
            .zip(&titles)
            .map(|(candidate, title)| {
                let category = self.classifier.classify(title);
                let category_ok = !query_category.conflicts_with(&category);
                let excluded_by = active_exclusions
                    .iter()
                    .find(|term| title.contains_keyword(term));
                // A listing with no usable name cannot be identified as anything.
                let (score, method) = if title.is_empty() {
                    (0.0, MatchMethod::Lexical)
                } else {
                    prepared.score(title)
                };

                if !category_ok {
                    debug!(
                        "'{}' vs '{}': category {} conflicts with {}",
                        query.name, candidate.title, query_category, category
                    );
                }
                if let Some(term) = excluded_by {
                    debug!(
                        "'{}' vs '{}': excluded by '{}'",
                        query.name, candidate.title, term.raw
                    );
                }

                MatchScore {
                    candidate: candidate.clone(),
                    score,
                    method,
                    category_ok,
                    exclusion_ok: excluded_by.is_none(),
                }
            })
            .collect();

        let best_passing = first_max(
            scores
                .iter()
                .zip(&titles)
                .filter(|(s, title)| !title.is_empty() && s.passes_gates())
                .map(|(s, _)| s),
        );

        let decision = match best_passing {
            Some(best) if best.score >= self.config.similarity_threshold => MatchDecision {
                accepted: true,
                best_candidate: Some(best.candidate.clone()),
                score: best.score,
                reason: MatchReason::Accepted,
                ranked: Vec::new(),
            },
            _ => {
                let top = first_max(scores.iter());
                let reason = match top {
                    Some(s) if !s.category_ok => MatchReason::CategoryMismatch,
                    Some(s) if !s.exclusion_ok => MatchReason::ExcludedTerm,
                    _ => MatchReason::BelowThreshold,
                };
                MatchDecision {
                    accepted: false,
                    best_candidate: None,
                    score: top.map(|s| s.score).unwrap_or(0.0),
                    reason,
                    ranked: Vec::new(),
                }
            }
        };

        let mut ranked = scores;
        // Stable sort: equal scores keep platform order.
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        debug!(
            "'{}': {} over {} candidates (score {:.3})",
            query.name,
            decision.reason,
            ranked.len(),
            decision.score
        );

        MatchDecision { ranked, ..decision }
    }
}

// Highest score, keeping the earliest on exact ties.
fn first_max<'a>(scores: impl Iterator<Item = &'a MatchScore>) -> Option<&'a MatchScore> {
    scores.fold(None, |best: Option<&MatchScore>, s| match best {
        Some(b) if s.score <= b.score => Some(b),
        _ => Some(s),
    })
}
