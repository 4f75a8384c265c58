// src/models/matching.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::product::Candidate;

/// Which scoring strategy produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Semantic,
    Lexical,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Semantic => "semantic",
            MatchMethod::Lexical => "lexical",
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    Accepted,
    BelowThreshold,
    CategoryMismatch,
    ExcludedTerm,
    NoCandidates,
}

impl MatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchReason::Accepted => "accepted",
            MatchReason::BelowThreshold => "below_threshold",
            MatchReason::CategoryMismatch => "category_mismatch",
            MatchReason::ExcludedTerm => "excluded_term",
            MatchReason::NoCandidates => "no_candidates",
        }
    }
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score of one (query, candidate) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchScore {
    pub candidate: Candidate,
    pub score: f64,
    pub method: MatchMethod,
    pub category_ok: bool,
    pub exclusion_ok: bool,
}

impl MatchScore {
    pub fn passes_gates(&self) -> bool {
        self.category_ok && self.exclusion_ok
    }
}

/// Terminal outcome for one (query, platform).
#[derive(Debug, Clone, PartialEq)]
pub struct MatchDecision {
    pub accepted: bool,
    /// Set only when `accepted`.
    pub best_candidate: Option<Candidate>,
    /// Score of the accepted candidate, or of the top-ranked candidate on rejection.
    pub score: f64,
    pub reason: MatchReason,
    /// Every candidate's score, highest first; ties keep platform order.
    pub ranked: Vec<MatchScore>,
}

impl MatchDecision {
    pub fn no_candidates() -> Self {
        Self {
            accepted: false,
            best_candidate: None,
            score: 0.0,
            reason: MatchReason::NoCandidates,
            ranked: Vec::new(),
        }
    }

    /// Scoring method of the top-ranked candidate, if any were scored.
    pub fn method(&self) -> Option<MatchMethod> {
        self.ranked.first().map(|s| s.method)
    }
}
