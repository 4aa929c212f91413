//! Term-frequency inverted index with BM25 scoring.
//!
//! One [`LexicalIndex`] exists per `(namespace, collection)` partition. The
//! "documents" of the BM25 formula are individual chunks: `N`, `df`, and
//! `avgdl` are all computed over the chunk population of the partition.
//!
//! # Scoring
//!
//! For each query token `t` and chunk `c`:
//!
//! ```text
//! idf   = ln((N - df + 0.5) / (df + 0.5) + 1)
//! score += idf × (tf × 2.0) / (tf + 1.5 × (0.25 + 0.75 × dl / avgdl))
//! ```
//!
//! where `tf` is the raw frequency of `t` in `c`, `dl` the token count of
//! `c` (at least 1), and `avgdl` the mean token count over the partition
//! (1 when the partition is empty or holds only empty chunks).

use std::collections::HashMap;

use crate::normalize::tokenize;

const TF_SCALE: f64 = 2.0;
const SATURATION: f64 = 1.5;
const LENGTH_BIAS: f64 = 0.25;
const B: f64 = 0.75;

#[derive(Debug, Clone, Default)]
struct ChunkTerms {
    freqs: HashMap<String, u32>,
    length: usize,
}

/// Per-partition inverted index: chunk → term counts, term → chunk frequency.
#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    chunks: HashMap<String, ChunkTerms>,
    doc_freq: HashMap<String, u32>,
    total_tokens: usize,
}

impl LexicalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the term counts of one chunk.
    ///
    /// Each distinct term bumps its document frequency exactly once,
    /// regardless of how often it repeats inside the chunk. Re-indexing an
    /// existing chunk id replaces the previous entry.
    pub fn index(&mut self, chunk_id: &str, text: &str) {
        if let Some(previous) = self.chunks.remove(chunk_id) {
            self.forget(&previous);
        }

        let tokens = tokenize(text);
        let mut freqs: HashMap<String, u32> = HashMap::new();
        for token in &tokens {
            *freqs.entry(token.clone()).or_insert(0) += 1;
        }
        for term in freqs.keys() {
            *self.doc_freq.entry(term.clone()).or_insert(0) += 1;
        }
        self.total_tokens += tokens.len();
        self.chunks.insert(
            chunk_id.to_string(),
            ChunkTerms {
                freqs,
                length: tokens.len(),
            },
        );
    }

    fn forget(&mut self, entry: &ChunkTerms) {
        for term in entry.freqs.keys() {
            if let Some(df) = self.doc_freq.get_mut(term) {
                *df -= 1;
                if *df == 0 {
                    self.doc_freq.remove(term);
                }
            }
        }
        self.total_tokens -= entry.length;
    }

    /// Number of chunks in the index.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Sum of token counts over every indexed chunk.
    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    /// Number of chunks containing `term` at least once.
    pub fn document_frequency(&self, term: &str) -> u32 {
        self.doc_freq.get(term).copied().unwrap_or(0)
    }

    fn avgdl(&self) -> f64 {
        if self.chunks.is_empty() || self.total_tokens == 0 {
            return 1.0;
        }
        self.total_tokens as f64 / self.chunks.len() as f64
    }

    /// BM25 score of every indexed chunk against `query_tokens`.
    ///
    /// Chunks sharing no term with the query are present with score `0.0`.
    /// Query tokens are expected lower-cased, as produced by
    /// [`tokenize`](crate::normalize::tokenize).
    pub fn score(&self, query_tokens: &[String]) -> HashMap<String, f64> {
        let n = self.chunks.len();
        let avgdl = self.avgdl();

        self.chunks
            .iter()
            .map(|(chunk_id, entry)| {
                let dl = entry.length.max(1);
                let score = query_tokens
                    .iter()
                    .map(|t| {
                        let tf = entry.freqs.get(t).copied().unwrap_or(0);
                        bm25_term_score(tf, self.document_frequency(t), n, dl, avgdl)
                    })
                    .sum();
                (chunk_id.clone(), score)
            })
            .collect()
    }
}

/// Inverse document frequency, always positive.
pub fn idf(df: u32, n: usize) -> f64 {
    let df = df as f64;
    ((n as f64 - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// Contribution of a single query term to a chunk's BM25 score.
pub fn bm25_term_score(tf: u32, df: u32, n: usize, dl: usize, avgdl: f64) -> f64 {
    let tf = tf as f64;
    let norm = SATURATION * (LENGTH_BIAS + B * dl as f64 / avgdl);
    idf(df, n) * (tf * TF_SCALE) / (tf + norm)
}
