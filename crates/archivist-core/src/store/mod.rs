//! Storage abstraction for Archivist.
//!
//! The [`Store`] trait defines the operations the ingestion orchestrator and
//! the retrieval engine need: append a new document version, score the
//! chunks of one partition, and summarize what is stored.
//!
//! Every operation is scoped to an [`IndexKey`]; partitions never interact.
//! Implementations must be `Send + Sync` and must make
//! [`add_document`](Store::add_document) atomic per key: readers see either
//! none or all of a document's chunks in both indexes, and concurrent
//! ingestions into the same key never share a version number.

pub mod lexical;
pub mod memory;
pub mod vector;

use std::sync::Arc;

use crate::models::{
    Chunk, CollectionSummary, Document, DocumentPreview, IndexKey, Metadata, StoreStats,
};

/// Maximum characters of the first chunk shown in a [`DocumentPreview`].
pub const SNIPPET_CHARS: usize = 280;

/// Everything needed to append a document, minus what the store assigns
/// (id, version, creation time).
#[derive(Debug, Clone, Default)]
pub struct NewDocument {
    pub content: String,
    pub chunks: Vec<Chunk>,
    pub metadata: Metadata,
    pub language: Option<String>,
}

/// A chunk of one partition together with its raw scores for a query.
///
/// Holds the parent document by `Arc`, so producing candidates never copies
/// chunk text.
#[derive(Debug, Clone)]
pub struct ChunkCandidate {
    pub document: Arc<Document>,
    chunk_index: usize,
    /// BM25 score (0.0 when no query term occurs in the chunk).
    pub lexical_score: f64,
    /// Dot product of query and chunk embeddings.
    pub vector_score: f64,
}

impl ChunkCandidate {
    pub fn new(
        document: Arc<Document>,
        chunk_index: usize,
        lexical_score: f64,
        vector_score: f64,
    ) -> Self {
        Self {
            document,
            chunk_index,
            lexical_score,
            vector_score,
        }
    }

    pub fn chunk(&self) -> &Chunk {
        &self.document.chunks[self.chunk_index]
    }
}

/// Abstract storage backend for Archivist.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`add_document`](Store::add_document) | Append the next version under a key and index its chunks |
/// | [`score_chunks`](Store::score_chunks) | BM25 + vector scores for every chunk under a key |
/// | [`collections`](Store::collections) | One summary per key |
/// | [`collection_documents`](Store::collection_documents) | Previews of every version under a key |
/// | [`stats`](Store::stats) | Store-wide totals |
pub trait Store: Send + Sync {
    /// Append a new document under `key`, assigning the next version.
    fn add_document(&self, key: &IndexKey, doc: NewDocument) -> Arc<Document>;

    /// Score every chunk under `key` against a tokenized and embedded query,
    /// from one consistent snapshot of the partition.
    ///
    /// Candidates come back in ingestion order. Unknown keys yield an empty
    /// list.
    fn score_chunks(
        &self,
        key: &IndexKey,
        query_tokens: &[String],
        query_vec: &[f32],
    ) -> Vec<ChunkCandidate>;

    /// Summaries ordered by `(namespace, collection)`, optionally restricted
    /// to one namespace.
    fn collections(&self, namespace: Option<&str>) -> Vec<CollectionSummary>;

    /// Previews of every document under `key`, newest version first.
    fn collection_documents(&self, key: &IndexKey) -> Vec<DocumentPreview>;

    /// All documents under `key`, oldest version first.
    fn documents(&self, key: &IndexKey) -> Vec<Arc<Document>>;

    fn stats(&self) -> StoreStats;
}
