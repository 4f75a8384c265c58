// src/error.rs
use thiserror::Error;

/// Errors raised by the matching core.
///
/// "Nothing matched" is never an error: it is an ordinary `MatchDecision`
/// carrying a reason code.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Invalid matcher configuration, reported before any fetching starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The sentence-embedding model could not be loaded. Only ever seen by the
    /// scorer's loader, which turns it into a permanent lexical fallback.
    #[error("semantic scorer unavailable: {0}")]
    ScorerUnavailable(String),
}
