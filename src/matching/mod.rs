pub mod aggregate;
pub mod category;
pub mod decision;
pub mod embedding;
pub mod manager;
pub mod normalize;
pub mod scorer;

pub use aggregate::{aggregate, aggregate_at, ResultAggregator};
pub use category::{Category, CategoryClassifier};
pub use decision::MatchEngine;
pub use manager::{run_price_matching_pipeline, PipelineOptions};
pub use normalize::{normalize, NormalizedText};
pub use scorer::{jaccard_similarity, shared_scorer, SimilarityScorer, TextEmbedder};
