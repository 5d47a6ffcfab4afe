//! FastEmbed-based embedder.
//!
//! Semantic embeddings from the all-MiniLM-L6-v2 ONNX model via fastembed-rs.
//! Only compiled with the `fastembed-embeddings` feature.

use super::{DEFAULT_DIMENSIONS, Embedder};
use crate::{Error, Result};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

/// Process-wide model instance, loaded on first use.
static EMBEDDING_MODEL: OnceLock<Mutex<fastembed::TextEmbedding>> = OnceLock::new();

/// `FastEmbed` embedder using all-MiniLM-L6-v2.
///
/// The model is lazily loaded on the first embed call.
pub struct FastEmbedEmbedder {
    model_name: &'static str,
}

impl FastEmbedEmbedder {
    /// Embedding dimensions of the model.
    pub const DEFAULT_DIMENSIONS: usize = DEFAULT_DIMENSIONS;

    /// Creates a new `FastEmbed` embedder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            model_name: "all-MiniLM-L6-v2",
        }
    }

    /// Returns the model name.
    #[must_use]
    pub const fn model_name(&self) -> &'static str {
        self.model_name
    }

    /// Gets or initializes the embedding model.
    ///
    /// The first call blocks while the ONNX model is loaded (and downloaded
    /// if not cached).
    fn get_model() -> Result<&'static Mutex<fastembed::TextEmbedding>> {
        if let Some(model) = EMBEDDING_MODEL.get() {
            return Ok(model);
        }

        tracing::info!("Loading embedding model (first use)...");
        let start = Instant::now();

        let options = fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(false);
        let model =
            fastembed::TextEmbedding::try_new(options).map_err(|e| Error::OperationFailed {
                operation: "load_embedding_model".to_string(),
                cause: e.to_string(),
            })?;

        tracing::info!(
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            model = "all-MiniLM-L6-v2",
            "Embedding model loaded"
        );

        let _ = EMBEDDING_MODEL.set(Mutex::new(model));
        EMBEDDING_MODEL.get().ok_or_else(|| Error::OperationFailed {
            operation: "get_embedding_model".to_string(),
            cause: "model initialization race".to_string(),
        })
    }
}

impl Default for FastEmbedEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for FastEmbedEmbedder {
    fn dimensions(&self) -> usize {
        Self::DEFAULT_DIMENSIONS
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::OperationFailed {
                operation: "embed".to_string(),
                cause: "no embedding returned from model".to_string(),
            })
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|t| t.is_empty()) {
            return Err(Error::InvalidInput("Cannot embed empty text".to_string()));
        }

        let model = Self::get_model()?;
        let texts_owned: Vec<String> = texts.iter().map(|s| (*s).to_string()).collect();

        // The ONNX runtime can panic on malformed input; contain it so that
        // deduplication degrades to a no-op instead of aborting the hook.
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut guard = model.lock().map_err(|e| Error::OperationFailed {
                operation: "embed_batch".to_string(),
                cause: format!("embedding model lock poisoned: {e}"),
            })?;
            guard
                .embed(texts_owned, None)
                .map_err(|e| Error::OperationFailed {
                    operation: "embed_batch".to_string(),
                    cause: e.to_string(),
                })
        }));

        result.map_err(|panic_info| {
            let panic_msg = panic_info
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic_info.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(
                panic_message = %panic_msg,
                batch_size = texts.len(),
                "ONNX runtime panicked during batch embedding"
            );
            Error::OperationFailed {
                operation: "embed_batch".to_string(),
                cause: format!("ONNX runtime panic: {panic_msg}"),
            }
        })?
    }
}
