// src/models/stats_models.rs
use std::collections::HashMap;
use std::time::Duration;

use log::{info, warn};

use crate::models::matching::{MatchDecision, MatchMethod, MatchReason};
use crate::models::product::Platform;

/// Counters for one pipeline run.
#[derive(Debug, Default, Clone)]
pub struct MatchingStats {
    pub products_processed: usize,
    pub pairs_checked: usize,
    pub candidates_scored: usize,
    pub fetch_failures: usize,
    /// Pairs whose decision task died; they are recorded as no-candidate rows.
    pub decision_failures: usize,
    pub decisions_by_reason: HashMap<MatchReason, usize>,
    pub scores_by_method: HashMap<MatchMethod, usize>,
    pub matches_by_platform: HashMap<Platform, usize>,
    pub avg_accepted_score: f64,
    pub processing_time: Duration,
}

impl MatchingStats {
    pub fn record_decision(&mut self, platform: Platform, decision: &MatchDecision) {
        let previous = self.accepted();
        self.pairs_checked += 1;
        self.candidates_scored += decision.ranked.len();
        *self.decisions_by_reason.entry(decision.reason).or_insert(0) += 1;
        for scored in &decision.ranked {
            *self.scores_by_method.entry(scored.method).or_insert(0) += 1;
        }

        if decision.accepted {
            *self.matches_by_platform.entry(platform).or_insert(0) += 1;
            self.avg_accepted_score =
                (self.avg_accepted_score * previous as f64 + decision.score) / (previous + 1) as f64;
        }
    }

    pub fn count(&self, reason: MatchReason) -> usize {
        self.decisions_by_reason.get(&reason).copied().unwrap_or(0)
    }

    pub fn accepted(&self) -> usize {
        self.count(MatchReason::Accepted)
    }

    pub fn rejected(&self) -> usize {
        self.pairs_checked - self.accepted()
    }

    pub fn log_summary(&self) {
        info!(
            "Price matching completed: {} products, {} product/platform pairs in {:.2?}",
            self.products_processed, self.pairs_checked, self.processing_time
        );
        info!(
            "  ✅ accepted: {} (avg score {:.3})",
            self.accepted(),
            self.avg_accepted_score
        );
        info!(
            "  ❌ rejected: {} (below_threshold: {}, category_mismatch: {}, excluded_term: {}, no_candidates: {})",
            self.rejected(),
            self.count(MatchReason::BelowThreshold),
            self.count(MatchReason::CategoryMismatch),
            self.count(MatchReason::ExcludedTerm),
            self.count(MatchReason::NoCandidates),
        );
        info!(
            "  candidates scored: {} (semantic: {}, lexical: {}), fetch failures: {}",
            self.candidates_scored,
            self.scores_by_method.get(&MatchMethod::Semantic).copied().unwrap_or(0),
            self.scores_by_method.get(&MatchMethod::Lexical).copied().unwrap_or(0),
            self.fetch_failures
        );
        if self.decision_failures > 0 {
            warn!("  ⚠️ {} pairs were never decided (decision task failed)", self.decision_failures);
        }
        for platform in Platform::ALL {
            if let Some(count) = self.matches_by_platform.get(&platform) {
                info!("  {}: {} matches", platform, count);
            }
        }
    }
}
