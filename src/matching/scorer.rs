// src/matching/scorer.rs
// Similarity scoring: sentence-embedding cosine when a model is available,
// Jaccard token overlap otherwise. The strategy is resolved once and never changes.

use std::sync::Arc;

use anyhow::Result;
use log::{debug, info, warn};
use once_cell::sync::OnceCell;

use crate::config::EmbeddingConfig;
use crate::error::MatchError;
use crate::matching::embedding::load_embedder;
use crate::matching::normalize::{normalize, NormalizedText};
use crate::models::MatchMethod;
use crate::utils::candle::cosine_similarity_candle;

/// Maps text to a fixed-length vector.
pub trait TextEmbedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

pub enum ScoringStrategy {
    Semantic(Arc<dyn TextEmbedder>),
    Lexical,
}

impl ScoringStrategy {
    pub fn method(&self) -> MatchMethod {
        match self {
            ScoringStrategy::Semantic(_) => MatchMethod::Semantic,
            ScoringStrategy::Lexical => MatchMethod::Lexical,
        }
    }
}

type EmbedderLoader = Box<dyn Fn() -> Result<Arc<dyn TextEmbedder>, MatchError> + Send + Sync>;

pub struct SimilarityScorer {
    strategy: OnceCell<ScoringStrategy>,
    loader: Option<EmbedderLoader>,
}

static SHARED_SCORER: OnceCell<Arc<SimilarityScorer>> = OnceCell::new();

/// Process-wide scorer. The first caller's configuration decides how it loads.
pub fn shared_scorer(config: &EmbeddingConfig) -> Arc<SimilarityScorer> {
    SHARED_SCORER
        .get_or_init(|| Arc::new(SimilarityScorer::from_config(config)))
        .clone()
}

impl SimilarityScorer {
    /// Scorer whose strategy is already fixed to Jaccard.
    pub fn lexical() -> Self {
        Self {
            strategy: OnceCell::with_value(ScoringStrategy::Lexical),
            loader: None,
        }
    }

    pub fn with_embedder(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self {
            strategy: OnceCell::with_value(ScoringStrategy::Semantic(embedder)),
            loader: None,
        }
    }

    /// Scorer that runs `loader` on first use. A failed load is cached as a
    /// permanent fallback to lexical scoring.
    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn TextEmbedder>, MatchError> + Send + Sync + 'static,
    {
        Self {
            strategy: OnceCell::new(),
            loader: Some(Box::new(loader)),
        }
    }

    pub fn from_config(config: &EmbeddingConfig) -> Self {
        if !config.enabled {
            info!("Semantic scoring disabled; using lexical similarity");
            return Self::lexical();
        }
        let config = config.clone();
        Self::with_loader(move || load_embedder(&config))
    }

    pub fn strategy(&self) -> &ScoringStrategy {
        self.strategy.get_or_init(|| self.resolve())
    }

    pub fn method(&self) -> MatchMethod {
        self.strategy().method()
    }

    fn resolve(&self) -> ScoringStrategy {
        let Some(loader) = &self.loader else {
            return ScoringStrategy::Lexical;
        };
        match loader() {
            Ok(embedder) => {
                info!("🧠 Semantic similarity scorer ready");
                ScoringStrategy::Semantic(embedder)
            }
            Err(e) => {
                warn!("{}. Falling back to lexical similarity for this run.", e);
                ScoringStrategy::Lexical
            }
        }
    }

    /// Prepares a query for scoring against many candidates, embedding it at most once.
    /// Both sides are embedded from their cleaned text, so case and punctuation never
    /// move a semantic score.
    pub fn prepare<'a>(&'a self, normalized: &'a NormalizedText) -> PreparedQuery<'a> {
        let embedding = match self.strategy() {
            ScoringStrategy::Semantic(embedder) if !normalized.is_empty() => {
                match embedder.embed(&normalized.cleaned) {
                    Ok(vector) => Some(vector),
                    Err(e) => {
                        debug!("Embedding query '{}' failed: {:#}", normalized.cleaned, e);
                        None
                    }
                }
            }
            _ => None,
        };
        PreparedQuery {
            scorer: self,
            normalized,
            embedding,
        }
    }

    pub fn score(&self, query_text: &str, candidate_text: &str) -> (f64, MatchMethod) {
        let query = normalize(query_text);
        let candidate = normalize(candidate_text);
        self.prepare(&query).score(&candidate)
    }
}

pub struct PreparedQuery<'a> {
    scorer: &'a SimilarityScorer,
    normalized: &'a NormalizedText,
    embedding: Option<Vec<f32>>,
}

impl PreparedQuery<'_> {
    pub fn score(&self, normalized: &NormalizedText) -> (f64, MatchMethod) {
        if let (ScoringStrategy::Semantic(embedder), Some(query_vec)) =
            (self.scorer.strategy(), &self.embedding)
        {
            if !normalized.is_empty() {
                let semantic = embedder
                    .embed(&normalized.cleaned)
                    .and_then(|candidate_vec| cosine_similarity_candle(query_vec, &candidate_vec));
                match semantic {
                    Ok(similarity) => return (similarity.clamp(0.0, 1.0), MatchMethod::Semantic),
                    Err(e) => debug!(
                        "Semantic scoring of '{}' failed, using lexical: {:#}",
                        normalized.cleaned, e
                    ),
                }
            }
        }
        (
            jaccard_similarity(self.normalized, normalized),
            MatchMethod::Lexical,
        )
    }
}

/// |A ∩ B| / |A ∪ B| over token sets. Two empty sets score 1.0, one empty set 0.0.
pub fn jaccard_similarity(a: &NormalizedText, b: &NormalizedText) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }
    let intersection = a.tokens.intersection(&b.tokens).count();
    let union = a.tokens.union(&b.tokens).count();
    intersection as f64 / union as f64
}
