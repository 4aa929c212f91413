//! Ingestion orchestration.
//!
//! Coordinates the flow for one piece of cleaned content:
//! normalization → language detection → chunking → per-chunk id, hash and
//! embedding → a single [`Store::add_document`] call.
//!
//! Loaders (files, scrapes, repositories, transcripts) live outside the
//! core and hand over plain text plus metadata. Archives arrive already
//! expanded into `(name, content)` pairs.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::chunk::{chunk_text, ChunkingParams};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::models::{Chunk, Document, IndexKey, Metadata};
use crate::normalize::{detect_language, normalize};
use crate::store::{NewDocument, Store};

/// Inputs for ingesting a single piece of content.
#[derive(Debug, Clone)]
pub struct IngestRequest<'a> {
    pub key: &'a IndexKey,
    pub content: &'a str,
    pub metadata: &'a Metadata,
    /// Overrides the default window size. `Some(0)` disables chunking.
    pub chunk_size: Option<usize>,
    /// Overrides the default window overlap.
    pub chunk_overlap: Option<usize>,
}

/// Turns cleaned content into a stored, indexed [`Document`].
pub struct Ingestor<S: Store + ?Sized> {
    store: Arc<S>,
    embedder: Arc<dyn Embedder>,
    defaults: ChunkingParams,
}

impl<S: Store + ?Sized> Ingestor<S> {
    pub fn new(store: Arc<S>, embedder: Arc<dyn Embedder>, defaults: ChunkingParams) -> Self {
        Self {
            store,
            embedder,
            defaults,
        }
    }

    /// Resolve per-request chunking overrides against the defaults.
    pub fn resolve_params(&self, size: Option<usize>, overlap: Option<usize>) -> ChunkingParams {
        ChunkingParams {
            size: size.unwrap_or(self.defaults.size),
            overlap: overlap.unwrap_or(self.defaults.overlap),
        }
    }

    /// Ingest one piece of content as the next version under `req.key`.
    ///
    /// A resolved overlap that is not smaller than the window size is not
    /// an error: the windows are laid out back to back instead. Empty
    /// content produces a document with a single empty chunk.
    pub fn ingest(&self, req: &IngestRequest<'_>) -> Result<Arc<Document>> {
        let params = self.resolve_params(req.chunk_size, req.chunk_overlap);
        if params.validate().is_err() {
            tracing::warn!(
                key = %req.key,
                size = params.size,
                overlap = params.overlap,
                "chunk overlap not smaller than size, chunking without overlap"
            );
        }

        let content = normalize(req.content);
        let language = detect_language(&content);

        let mut chunk_metadata = Metadata::new();
        chunk_metadata.insert("collection".to_string(), req.key.collection.clone());
        chunk_metadata.extend(req.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));

        let nonce = Uuid::new_v4();
        let chunks: Vec<Chunk> = chunk_text(&content, params.size, params.overlap)
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let text = normalize(raw);
                Chunk {
                    id: chunk_id(&nonce, i, &text),
                    chunk_index: i,
                    hash: content_hash(&text),
                    embedding: self.embedder.embed(&text),
                    metadata: chunk_metadata.clone(),
                    text,
                }
            })
            .collect();

        let mut doc_metadata = req.metadata.clone();
        doc_metadata.insert("language".to_string(), language.clone());

        let chunk_count = chunks.len();
        let document = self.store.add_document(
            req.key,
            NewDocument {
                content,
                chunks,
                metadata: doc_metadata,
                language: Some(language),
            },
        );

        tracing::info!(
            key = %req.key,
            document_id = %document.id,
            version = document.version,
            chunks = chunk_count,
            language = document.language.as_deref().unwrap_or_default(),
            "ingested document"
        );

        Ok(document)
    }

    /// Ingest every entry of an expanded archive, in order.
    ///
    /// Each entry becomes its own document, tagged with `archive` (the
    /// archive name) and `source_file` (the entry name); caller metadata
    /// takes precedence over both tags. Returns the **last** document
    /// ingested, or `None` for an empty archive. Callers that need every
    /// document should call [`ingest`](Self::ingest) per entry with
    /// [`archive_entry_metadata`].
    pub fn ingest_archive<I>(
        &self,
        key: &IndexKey,
        archive_name: &str,
        entries: I,
        metadata: &Metadata,
        chunk_size: Option<usize>,
        chunk_overlap: Option<usize>,
    ) -> Result<Option<Arc<Document>>>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut last = None;
        for (name, content) in entries {
            let entry_metadata = archive_entry_metadata(archive_name, &name, metadata);

            let doc = self.ingest(&IngestRequest {
                key,
                content: &content,
                metadata: &entry_metadata,
                chunk_size,
                chunk_overlap,
            })?;
            last = Some(doc);
        }
        Ok(last)
    }
}

/// Metadata for one archive entry: `archive` and `source_file` tags with
/// the caller's metadata layered on top.
pub fn archive_entry_metadata(archive_name: &str, entry_name: &str, metadata: &Metadata) -> Metadata {
    let mut entry_metadata = Metadata::new();
    entry_metadata.insert("archive".to_string(), archive_name.to_string());
    entry_metadata.insert("source_file".to_string(), entry_name.to_string());
    entry_metadata.extend(metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
    entry_metadata
}

/// Unique chunk id: SHA-256 over a per-ingestion nonce, the chunk's
/// sequence number, and its text. Independent of clock resolution.
fn chunk_id(nonce: &Uuid, index: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce.as_bytes());
    hasher.update((index as u64).to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// SHA-256 of the chunk text.
fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}
