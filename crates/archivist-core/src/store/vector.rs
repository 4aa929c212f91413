//! Brute-force vector index over pre-normalized embeddings.

use std::collections::HashMap;

use crate::embedding::dot;

/// Per-partition map from chunk id to embedding.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    vectors: HashMap<String, Vec<f32>>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the vector for `chunk_id`, returning the one it replaced.
    pub fn index(&mut self, chunk_id: &str, embedding: Vec<f32>) -> Option<Vec<f32>> {
        self.vectors.insert(chunk_id.to_string(), embedding)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dot product of `query` with every stored vector.
    ///
    /// Both sides are unit vectors (or zero), so this is cosine similarity.
    pub fn similarity(&self, query: &[f32]) -> HashMap<String, f64> {
        self.vectors
            .iter()
            .map(|(id, v)| (id.clone(), dot(query, v) as f64))
            .collect()
    }
}
