//! Core data models used throughout Archivist.
//!
//! These types represent the documents, chunks, and search results that flow
//! through the ingestion and retrieval pipeline. Stored [`Document`]s and
//! [`Chunk`]s are immutable once created; per-query scores live on
//! [`SearchHit`] values instead.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// String → string metadata attached to documents and chunks.
pub type Metadata = BTreeMap<String, String>;

/// The `(namespace, collection)` pair every index and store is partitioned by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct IndexKey {
    pub namespace: String,
    pub collection: String,
}

impl IndexKey {
    pub fn new(namespace: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.collection)
    }
}

/// A chunk of a document's normalized text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    /// Globally unique chunk id.
    pub id: String,
    /// Position of this chunk within its parent document.
    pub chunk_index: usize,
    pub text: String,
    /// SHA-256 of `text`.
    pub hash: String,
    #[serde(skip_serializing)]
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
}

/// One immutable version of an ingested source under an [`IndexKey`].
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub namespace: String,
    pub collection: String,
    /// Starts at 1 and increases by one per ingestion into the same key.
    pub version: u32,
    pub content: String,
    pub chunks: Vec<Chunk>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub language: Option<String>,
}

impl Document {
    /// Detected language, falling back to the `language` metadata entry.
    pub fn effective_language(&self) -> Option<&str> {
        self.language
            .as_deref()
            .or_else(|| self.metadata.get("language").map(String::as_str))
    }
}

/// A ranked chunk returned from a search.
///
/// A copy of the stored chunk's public fields plus the per-query scores, so
/// concurrent searches never share mutable state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub chunk_id: String,
    pub document_id: String,
    pub text: String,
    pub metadata: Metadata,
    /// `vector_weight × vector_score + lexical_weight × lexical_score`.
    pub score: f64,
    pub lexical_score: f64,
    pub vector_score: f64,
}

/// Per-key overview returned by `ListCollections`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub namespace: String,
    pub collection: String,
    pub documents: usize,
    pub chunks: usize,
    pub latest_version: u32,
    /// Distinct detected languages, sorted.
    pub languages: Vec<String>,
    pub latest_ingested_at: Option<DateTime<Utc>>,
}

/// Per-document preview returned by `ListDocuments`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentPreview {
    pub id: String,
    pub version: u32,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub chunks: usize,
    pub snippet: String,
    pub language: Option<String>,
}

/// Store-wide totals returned by `Stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub document_count: usize,
    pub chunk_count: usize,
    pub vector_count: usize,
    /// Mean whitespace-token count per chunk (0.0 when empty).
    pub avg_chunk_length: f64,
}
