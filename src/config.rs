// src/config.rs
// Matcher configuration. Built by the binaries (env, JSON file, CLI flags) and
// handed to the core; the core never reads the environment itself.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::matching::category::default_category_rules;
use crate::matching::decision::DEFAULT_EXCLUSION_TERMS;
use crate::models::Platform;
use crate::utils::env::env_list;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// A category and the keywords that identify it. Keywords may be phrases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// When false the lexical scorer is used without attempting a model load.
    pub enabled: bool,
    /// Hugging Face model id, fetched on first use when `model_dir` is unset.
    pub model_id: String,
    pub revision: String,
    /// Local directory holding config.json, tokenizer.json and model.safetensors.
    pub model_dir: Option<PathBuf>,
    pub max_seq_len: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_id: DEFAULT_EMBEDDING_MODEL.to_string(),
            revision: "main".to_string(),
            model_dir: None,
            max_seq_len: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Minimum similarity for acceptance, inclusive, in [0, 1].
    pub similarity_threshold: f64,
    pub platforms: Vec<Platform>,
    /// Accessory terms that disqualify a listing unless the query also has them.
    pub exclusion_terms: Vec<String>,
    /// Checked in order; the first matching category wins.
    pub categories: Vec<CategoryRule>,
    pub embedding: EmbeddingConfig,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            platforms: Platform::ALL.to_vec(),
            exclusion_terms: DEFAULT_EXCLUSION_TERMS.iter().map(|t| t.to_string()).collect(),
            categories: default_category_rules(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl MatcherConfig {
    /// Defaults overridden by environment variables. Unparseable values keep the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.similarity_threshold = env::var("SIMILARITY_THRESHOLD")
            .unwrap_or_else(|_| DEFAULT_SIMILARITY_THRESHOLD.to_string())
            .parse()
            .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD);

        if let Some(names) = env_list("PLATFORMS") {
            config.platforms = names
                .iter()
                .filter_map(|name| match name.parse::<Platform>() {
                    Ok(platform) => Some(platform),
                    Err(e) => {
                        warn!("Ignoring PLATFORMS entry: {}", e);
                        None
                    }
                })
                .collect();
        }

        if let Some(terms) = env_list("EXCLUSION_TERMS") {
            config.exclusion_terms = terms;
        }

        config.embedding.enabled = env::var("EMBEDDING_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);
        if let Ok(model_id) = env::var("EMBEDDING_MODEL_ID") {
            config.embedding.model_id = model_id;
        }
        config.embedding.model_dir = env::var("EMBEDDING_MODEL_DIR").ok().map(PathBuf::from);

        config
    }

    /// Full configuration from a JSON file; omitted fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read matcher config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse matcher config {}", path.display()))
    }

    /// Rejects configurations the core cannot run with.
    pub fn validate(&self) -> Result<(), MatchError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(MatchError::Configuration(format!(
                "similarity threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        if self.platforms.is_empty() {
            return Err(MatchError::Configuration(
                "at least one platform must be configured".to_string(),
            ));
        }
        if let Some(rule) = self.categories.iter().find(|r| r.keywords.is_empty()) {
            return Err(MatchError::Configuration(format!(
                "category '{}' has no trigger keywords",
                rule.name
            )));
        }
        Ok(())
    }

    pub fn log_config(&self) {
        info!("🎯 Similarity threshold: {}", self.similarity_threshold);
        info!(
            "🛒 Platforms: {}",
            self.platforms
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        info!(
            "🚫 Exclusion terms ({}): {:?}",
            self.exclusion_terms.len(),
            self.exclusion_terms
        );
        info!(
            "🗂️  Categories: {}",
            self.categories
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        if self.embedding.enabled {
            match &self.embedding.model_dir {
                Some(dir) => info!("🧠 Semantic scoring ENABLED (model dir: {})", dir.display()),
                None => info!("🧠 Semantic scoring ENABLED (model: {})", self.embedding.model_id),
            }
        } else {
            info!("🧠 Semantic scoring DISABLED - using lexical similarity");
        }
    }
}
