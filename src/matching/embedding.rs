// src/matching/embedding.rs
// Sentence embeddings from a BERT-family model (all-MiniLM-L6-v2 by default), run with candle.

use crate::config::EmbeddingConfig;
use crate::error::MatchError;

#[cfg(feature = "semantic")]
mod candle_impl {
    use std::path::{Path, PathBuf};
    use std::time::Instant;

    use anyhow::{anyhow, Context, Result};
    use candle_core::{Device, Tensor};
    use candle_nn::VarBuilder;
    use candle_transformers::models::bert::{BertModel, Config, DTYPE};
    use hf_hub::{api::sync::Api, Repo, RepoType};
    use log::info;
    use tokenizers::{Tokenizer, TruncationParams};

    use crate::config::EmbeddingConfig;
    use crate::error::MatchError;
    use crate::matching::scorer::TextEmbedder;
    use crate::utils::candle::CANDLE_DEVICE;

    struct ModelFiles {
        config: PathBuf,
        tokenizer: PathBuf,
        weights: PathBuf,
    }

    pub struct SentenceEmbedder {
        model: BertModel,
        tokenizer: Tokenizer,
        device: Device,
    }

    impl SentenceEmbedder {
        pub fn load(config: &EmbeddingConfig) -> Result<Self, MatchError> {
            let start = Instant::now();
            let files = resolve_files(config)
                .map_err(|e| MatchError::ScorerUnavailable(format!("{:#}", e)))?;

            let device = CANDLE_DEVICE.clone();

            let bert_config: Config = std::fs::read_to_string(&files.config)
                .map_err(|e| MatchError::ScorerUnavailable(format!("Failed to read config.json: {}", e)))
                .and_then(|raw| {
                    serde_json::from_str(&raw).map_err(|e| {
                        MatchError::ScorerUnavailable(format!("Failed to parse config.json: {}", e))
                    })
                })?;

            let vb = unsafe {
                VarBuilder::from_mmaped_safetensors(&[files.weights], DTYPE, &device).map_err(|e| {
                    MatchError::ScorerUnavailable(format!("Failed to load weights: {}", e))
                })?
            };
            let model = BertModel::load(vb, &bert_config).map_err(|e| {
                MatchError::ScorerUnavailable(format!("Failed to build BERT model: {}", e))
            })?;

            let mut tokenizer = Tokenizer::from_file(&files.tokenizer).map_err(|e| {
                MatchError::ScorerUnavailable(format!("Failed to load tokenizer: {}", e))
            })?;
            tokenizer
                .with_truncation(Some(TruncationParams {
                    max_length: config.max_seq_len,
                    ..Default::default()
                }))
                .map_err(|e| {
                    MatchError::ScorerUnavailable(format!("Failed to configure truncation: {}", e))
                })?;
            tokenizer.with_padding(None);

            info!(
                "Sentence embedding model loaded in {:.2?} (device: {:?})",
                start.elapsed(),
                device
            );

            Ok(Self {
                model,
                tokenizer,
                device,
            })
        }
    }

    impl TextEmbedder for SentenceEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

            let ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
            let type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
            let mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

            let hidden = self
                .model
                .forward(&ids, &type_ids, Some(&mask))
                .context("BERT forward pass failed")?;

            // Mean pooling over real (unmasked) tokens.
            let mask = mask.to_dtype(DTYPE)?.unsqueeze(2)?;
            let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
            let counts = mask.sum(1)?;
            let pooled = summed.broadcast_div(&counts)?;

            Ok(pooled.squeeze(0)?.to_vec1::<f32>()?)
        }
    }

    fn resolve_files(config: &EmbeddingConfig) -> Result<ModelFiles> {
        if let Some(dir) = &config.model_dir {
            return local_files(dir);
        }

        info!(
            "Fetching embedding model {} (revision {}) from the Hugging Face hub",
            config.model_id, config.revision
        );
        let api = Api::new().context("Failed to create Hugging Face API client")?;
        let repo = api.repo(Repo::with_revision(
            config.model_id.clone(),
            RepoType::Model,
            config.revision.clone(),
        ));
        Ok(ModelFiles {
            config: repo.get("config.json").context("Failed to fetch config.json")?,
            tokenizer: repo
                .get("tokenizer.json")
                .context("Failed to fetch tokenizer.json")?,
            weights: repo
                .get("model.safetensors")
                .context("Failed to fetch model.safetensors")?,
        })
    }

    fn local_files(dir: &Path) -> Result<ModelFiles> {
        let files = ModelFiles {
            config: dir.join("config.json"),
            tokenizer: dir.join("tokenizer.json"),
            weights: dir.join("model.safetensors"),
        };
        for path in [&files.config, &files.tokenizer, &files.weights] {
            if !path.exists() {
                return Err(anyhow!("Embedding model file not found: {}", path.display()));
            }
        }
        Ok(files)
    }
}

#[cfg(feature = "semantic")]
pub use candle_impl::SentenceEmbedder;

/// Loads the configured sentence-embedding model as a scorer backend.
#[cfg(feature = "semantic")]
pub fn load_embedder(
    config: &EmbeddingConfig,
) -> Result<std::sync::Arc<dyn crate::matching::scorer::TextEmbedder>, MatchError> {
    Ok(std::sync::Arc::new(SentenceEmbedder::load(config)?))
}

#[cfg(not(feature = "semantic"))]
pub fn load_embedder(
    config: &EmbeddingConfig,
) -> Result<std::sync::Arc<dyn crate::matching::scorer::TextEmbedder>, MatchError> {
    Err(MatchError::ScorerUnavailable(format!(
        "built without the `semantic` feature; cannot load {}",
        config.model_id
    )))
}
