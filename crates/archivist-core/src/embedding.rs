//! Embedding provider trait, the hashing embedder, and vector utilities.
//!
//! Defines the [`Embedder`] trait that the ingestion orchestrator and the
//! retrieval engine use to turn text into vectors, plus [`HashEmbedder`],
//! a deterministic bag-of-words embedding that needs no model files.
//!
//! # Hashing Scheme
//!
//! 1. Tokenize on whitespace and lower-case.
//! 2. Map each token to a bucket in `[0, dims)` via the first 8 bytes of
//!    its SHA-256 digest.
//! 3. Increment that bucket.
//! 4. L2-normalize (the zero vector is returned as-is).

use sha2::{Digest, Sha256};

use crate::error::{CoreError, Result};
use crate::normalize::tokenize;

/// Default embedding dimensionality.
pub const DEFAULT_DIMS: usize = 128;

/// Trait for embedding providers.
///
/// Implementations must be deterministic within a process: embedding the
/// same text twice yields bit-identical vectors.
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"hash-bow-128"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality.
    fn dims(&self) -> usize;
    /// Embed a single text.
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Deterministic bag-of-words hashing embedder.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dims: usize,
    model: String,
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Result<Self> {
        if dims == 0 {
            return Err(CoreError::invalid_configuration(
                "embedding dims must be > 0",
            ));
        }
        Ok(Self {
            dims,
            model: format!("hash-bow-{}", dims),
        })
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(prefix) % self.dims as u64) as usize
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self {
            dims: DEFAULT_DIMS,
            model: format!("hash-bow-{}", DEFAULT_DIMS),
        }
    }
}

impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dims];
        for token in tokenize(text) {
            vec[self.bucket(&token)] += 1.0;
        }
        l2_normalize(&mut vec);
        vec
    }
}

/// Scale `vec` to unit length in place. Zero vectors are left unchanged.
pub fn l2_normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vec.iter_mut() {
            *x /= norm;
        }
    }
}

/// Dot product of two vectors.
///
/// For unit vectors this equals cosine similarity. Returns `0.0` for
/// vectors of different lengths.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_is_deterministic() {
        let e = HashEmbedder::default();
        let a = e.embed("The same text twice");
        let b = e.embed("The same text twice");
        assert_eq!(a.len(), DEFAULT_DIMS);
        assert_eq!(
            a.iter().map(|x| x.to_bits()).collect::<Vec<_>>(),
            b.iter().map(|x| x.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_embed_is_unit_length() {
        let e = HashEmbedder::default();
        let v = e.embed("alpha beta gamma alpha");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_embed_case_insensitive() {
        let e = HashEmbedder::default();
        assert_eq!(e.embed("Hello World"), e.embed("hello world"));
    }

    #[test]
    fn test_embed_empty_is_zero_vector() {
        let e = HashEmbedder::new(16).unwrap();
        let v = e.embed("");
        assert_eq!(v, vec![0.0; 16]);
    }

    #[test]
    fn test_self_similarity_is_one() {
        let e = HashEmbedder::default();
        let v = e.embed("retrieval augmented generation with chunks");
        assert!((dot(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_dims_rejected() {
        assert!(matches!(
            HashEmbedder::new(0),
            Err(CoreError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_model_name() {
        let e = HashEmbedder::new(64).unwrap();
        assert_eq!(e.model_name(), "hash-bow-64");
        assert_eq!(e.dims(), 64);
    }

    #[test]
    fn test_dot_different_lengths() {
        assert_eq!(dot(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(dot(&[], &[]), 0.0);
    }
}
