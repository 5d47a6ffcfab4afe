//! Embedding generation.
//!
//! Deduplication consumes one unit-normalized vector per entry text through
//! the [`Embedder`] trait. The real provider is fastembed, compiled in with
//! the `fastembed-embeddings` feature; without it no provider exists and
//! deduplication is skipped.

#[cfg(feature = "fastembed-embeddings")]
mod fastembed;

#[cfg(feature = "fastembed-embeddings")]
pub use fastembed::FastEmbedEmbedder;

use crate::Result;

/// Embedding dimensions of all-MiniLM-L6-v2.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Trait for embedding generators.
pub trait Embedder: Send + Sync {
    /// Returns the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Generates an embedding for the given text.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generates embeddings for multiple texts, in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Returns the embedding provider compiled into this build, if any.
#[must_use]
pub fn default_embedder() -> Option<Box<dyn Embedder>> {
    #[cfg(feature = "fastembed-embeddings")]
    {
        Some(Box::new(FastEmbedEmbedder::new()))
    }
    #[cfg(not(feature = "fastembed-embeddings"))]
    {
        tracing::debug!("No embedding provider compiled in (fastembed-embeddings feature disabled)");
        None
    }
}

/// Computes cosine similarity between two embedding vectors.
///
/// # Returns
///
/// Cosine similarity in range [-1.0, 1.0], or 0.0 if vectors are invalid.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let v = vec![0.6, 0.8, 0.0];
        assert!(approx_eq(cosine_similarity(&v, &v), 1.0));
    }

    #[test]
    fn test_cosine_similarity_orthogonal_and_opposite() {
        assert!(approx_eq(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0));
        assert!(approx_eq(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), -1.0));
    }

    #[test]
    fn test_cosine_similarity_invalid_inputs() {
        assert!(approx_eq(cosine_similarity(&[], &[]), 0.0));
        assert!(approx_eq(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0));
        assert!(approx_eq(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0));
    }

    #[test]
    fn test_cosine_similarity_ignores_magnitude() {
        assert!(approx_eq(cosine_similarity(&[2.0, 0.0], &[5.0, 0.0]), 1.0));
    }

    #[cfg(not(feature = "fastembed-embeddings"))]
    #[test]
    fn test_no_default_embedder_without_feature() {
        assert!(default_embedder().is_none());
    }
}
