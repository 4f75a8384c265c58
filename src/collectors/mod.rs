// src/collectors/mod.rs
// Boundary to whatever fetches platform search results (a browser scraper, a
// recorded snapshot, a test double). The matching core only sees `Candidate`s.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Candidate, Platform, ProductQuery};

pub mod search_terms;
pub mod snapshot;

pub use search_terms::search_keywords;
pub use snapshot::SnapshotSource;

#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Listings for `query` on `platform`, in the platform's result order. May be empty.
    async fn fetch_candidates(&self, query: &ProductQuery, platform: Platform) -> Result<Vec<Candidate>>;
}
