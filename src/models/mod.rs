pub mod matching;
pub mod product;
pub mod record;
pub mod stats_models;

pub use matching::{MatchDecision, MatchMethod, MatchReason, MatchScore};
pub use product::{Candidate, Platform, ProductQuery, RawListing};
pub use record::{PriceRecord, PRICE_RECORD_HEADER};
pub use stats_models::MatchingStats;
