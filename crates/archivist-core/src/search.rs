//! Hybrid retrieval over one `(namespace, collection)` partition.
//!
//! The search algorithm operates entirely through the [`Store`] trait and
//! an [`Embedder`]; it has no configuration or I/O dependencies.
//!
//! # Hybrid Scoring Algorithm
//!
//! 1. Embed the query and tokenize it (lower-cased whitespace tokens).
//! 2. Fetch BM25 and vector scores for every chunk under the key, from one
//!    consistent snapshot of the partition.
//! 3. Drop chunks whose metadata fails any filter (exact match, AND).
//! 4. Merge: `score = vector_weight × vector + lexical_weight × lexical`
//!    (defaults 0.6 and 0.4; raw scores, no normalization).
//! 5. Sort by score (desc), then chunk id (asc).
//! 6. Truncate to `top_k`.
//!
//! Results are [`SearchHit`] copies; stored chunks are never mutated.

use std::cmp::Ordering;

use crate::embedding::Embedder;
use crate::models::{IndexKey, Metadata, SearchHit};
use crate::normalize::tokenize;
use crate::store::{ChunkCandidate, Store};

/// Default number of results.
pub const DEFAULT_TOP_K: usize = 5;

/// Fusion weights, decoupled from application config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    pub vector_weight: f64,
    pub lexical_weight: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            vector_weight: 0.6,
            lexical_weight: 0.4,
        }
    }
}

/// Exact-match metadata constraints, evaluated as a conjunction.
///
/// No negation, ranges, or wildcards. An empty filter set matches every
/// chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(Vec<(String, String)>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `key == value` constraint.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.0
            .iter()
            .all(|(k, v)| metadata.get(k).is_some_and(|m| m == v))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Bundles all inputs for a single search invocation.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    pub key: &'a IndexKey,
    pub query: &'a str,
    pub top_k: usize,
    pub filters: &'a Filters,
}

/// Run a hybrid search against a [`Store`] backend.
///
/// Never fails: an unknown key, an empty partition, or filters that exclude
/// everything all produce an empty result.
pub fn search<S: Store + ?Sized>(
    store: &S,
    embedder: &dyn Embedder,
    params: &SearchParams,
    req: &SearchRequest<'_>,
) -> Vec<SearchHit> {
    if req.top_k == 0 {
        return Vec::new();
    }

    let query_vec = embedder.embed(req.query);
    let query_tokens = tokenize(req.query);
    let candidates = store.score_chunks(req.key, &query_tokens, &query_vec);
    let total = candidates.len();

    let mut scored: Vec<(f64, ChunkCandidate)> = candidates
        .into_iter()
        .filter(|c| req.filters.matches(&c.chunk().metadata))
        .map(|c| (fuse(params, &c), c))
        .collect();

    scored.sort_by(|(sa, a), (sb, b)| {
        sb.partial_cmp(sa)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.chunk().id.cmp(&b.chunk().id))
    });
    scored.truncate(req.top_k);

    tracing::debug!(
        key = %req.key,
        candidates = total,
        returned = scored.len(),
        "hybrid search"
    );

    scored
        .into_iter()
        .map(|(score, c)| {
            let chunk = c.chunk();
            SearchHit {
                chunk_id: chunk.id.clone(),
                document_id: c.document.id.clone(),
                text: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
                score,
                lexical_score: c.lexical_score,
                vector_score: c.vector_score,
            }
        })
        .collect()
}

/// Weighted sum of a candidate's vector and lexical scores.
pub fn fuse(params: &SearchParams, candidate: &ChunkCandidate) -> f64 {
    params.vector_weight * candidate.vector_score + params.lexical_weight * candidate.lexical_score
}
