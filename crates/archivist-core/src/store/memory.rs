//! In-memory [`Store`] implementation.
//!
//! Each `(namespace, collection)` key owns a [`Partition`] behind its own
//! `RwLock`, so ingestions into different keys never contend and an
//! ingestion is applied under a single write guard (version assignment,
//! lexical and vector registration, append). Scoring is brute force over
//! the partition.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::models::{CollectionSummary, Document, DocumentPreview, IndexKey, StoreStats};

use super::lexical::LexicalIndex;
use super::vector::VectorIndex;
use super::{ChunkCandidate, NewDocument, Store, SNIPPET_CHARS};

/// Documents and indexes of a single key.
#[derive(Debug, Default)]
struct Partition {
    documents: Vec<Arc<Document>>,
    lexical: LexicalIndex,
    vectors: VectorIndex,
}

impl Partition {
    fn chunk_count(&self) -> usize {
        self.documents.iter().map(|d| d.chunks.len()).sum()
    }

    fn summary(&self, key: &IndexKey) -> CollectionSummary {
        let languages: BTreeSet<String> = self
            .documents
            .iter()
            .filter_map(|d| d.effective_language().map(str::to_string))
            .collect();

        CollectionSummary {
            namespace: key.namespace.clone(),
            collection: key.collection.clone(),
            documents: self.documents.len(),
            chunks: self.chunk_count(),
            latest_version: self.documents.iter().map(|d| d.version).max().unwrap_or(0),
            languages: languages.into_iter().collect(),
            latest_ingested_at: self.documents.iter().map(|d| d.created_at).max(),
        }
    }
}

fn preview(doc: &Document) -> DocumentPreview {
    let snippet = doc
        .chunks
        .first()
        .map(|c| c.text.chars().take(SNIPPET_CHARS).collect::<String>())
        .unwrap_or_default();

    DocumentPreview {
        id: doc.id.clone(),
        version: doc.version,
        metadata: doc.metadata.clone(),
        created_at: doc.created_at,
        chunks: doc.chunks.len(),
        snippet,
        language: doc.effective_language().map(str::to_string),
    }
}

// A poisoned guard still protects a consistent partition: every mutation
// happens after all fallible work is done.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory store, created once per process and shared by reference.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    partitions: RwLock<BTreeMap<IndexKey, Arc<RwLock<Partition>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn partition(&self, key: &IndexKey) -> Option<Arc<RwLock<Partition>>> {
        read(&self.partitions).get(key).cloned()
    }

    fn partition_or_create(&self, key: &IndexKey) -> Arc<RwLock<Partition>> {
        if let Some(p) = self.partition(key) {
            return p;
        }
        write(&self.partitions)
            .entry(key.clone())
            .or_default()
            .clone()
    }

    fn all_partitions(&self) -> Vec<(IndexKey, Arc<RwLock<Partition>>)> {
        read(&self.partitions)
            .iter()
            .map(|(k, p)| (k.clone(), Arc::clone(p)))
            .collect()
    }
}

impl Store for InMemoryStore {
    fn add_document(&self, key: &IndexKey, doc: NewDocument) -> Arc<Document> {
        let partition = self.partition_or_create(key);
        let mut part = write(&partition);

        let version = part.documents.len() as u32 + 1;
        let document = Arc::new(Document {
            id: Uuid::new_v4().to_string(),
            namespace: key.namespace.clone(),
            collection: key.collection.clone(),
            version,
            content: doc.content,
            chunks: doc.chunks,
            metadata: doc.metadata,
            created_at: Utc::now(),
            language: doc.language,
        });

        for chunk in &document.chunks {
            part.lexical.index(&chunk.id, &chunk.text);
            if part
                .vectors
                .index(&chunk.id, chunk.embedding.clone())
                .is_some()
            {
                tracing::warn!(%key, chunk_id = %chunk.id, "chunk id collision, vector replaced");
            }
        }
        part.documents.push(Arc::clone(&document));

        document
    }

    fn score_chunks(
        &self,
        key: &IndexKey,
        query_tokens: &[String],
        query_vec: &[f32],
    ) -> Vec<ChunkCandidate> {
        let Some(partition) = self.partition(key) else {
            return Vec::new();
        };
        let part = read(&partition);
        if part.vectors.is_empty() {
            return Vec::new();
        }

        let lexical = part.lexical.score(query_tokens);
        let vector = part.vectors.similarity(query_vec);

        let mut candidates = Vec::with_capacity(part.lexical.len());
        for doc in &part.documents {
            for (i, chunk) in doc.chunks.iter().enumerate() {
                let Some(&vector_score) = vector.get(&chunk.id) else {
                    continue;
                };
                let lexical_score = lexical.get(&chunk.id).copied().unwrap_or(0.0);
                candidates.push(ChunkCandidate::new(
                    Arc::clone(doc),
                    i,
                    lexical_score,
                    vector_score,
                ));
            }
        }
        candidates
    }

    fn collections(&self, namespace: Option<&str>) -> Vec<CollectionSummary> {
        self.all_partitions()
            .into_iter()
            .filter(|(key, _)| namespace.map_or(true, |ns| key.namespace == ns))
            .filter_map(|(key, partition)| {
                let part = read(&partition);
                (!part.documents.is_empty()).then(|| part.summary(&key))
            })
            .collect()
    }

    fn collection_documents(&self, key: &IndexKey) -> Vec<DocumentPreview> {
        let Some(partition) = self.partition(key) else {
            return Vec::new();
        };
        let part = read(&partition);
        let mut previews: Vec<DocumentPreview> =
            part.documents.iter().map(|d| preview(d)).collect();
        previews.sort_by(|a, b| b.version.cmp(&a.version));
        previews
    }

    fn documents(&self, key: &IndexKey) -> Vec<Arc<Document>> {
        self.partition(key)
            .map(|p| read(&p).documents.clone())
            .unwrap_or_default()
    }

    fn stats(&self) -> StoreStats {
        let mut stats = StoreStats::default();
        let mut total_tokens = 0usize;

        for (_, partition) in self.all_partitions() {
            let part = read(&partition);
            stats.document_count += part.documents.len();
            stats.chunk_count += part.chunk_count();
            stats.vector_count += part.vectors.len();
            total_tokens += part.lexical.total_tokens();
        }

        if stats.chunk_count > 0 {
            stats.avg_chunk_length = total_tokens as f64 / stats.chunk_count as f64;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{Embedder, HashEmbedder};
    use crate::models::{Chunk, Metadata};
    use crate::normalize::tokenize;

    fn chunk(id: &str, text: &str) -> Chunk {
        let embedder = HashEmbedder::default();
        Chunk {
            id: id.to_string(),
            chunk_index: 0,
            text: text.to_string(),
            hash: String::new(),
            embedding: embedder.embed(text),
            metadata: Metadata::new(),
        }
    }

    fn new_doc(chunks: Vec<Chunk>, language: Option<&str>) -> NewDocument {
        NewDocument {
            content: chunks
                .iter()
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            chunks,
            metadata: Metadata::new(),
            language: language.map(str::to_string),
        }
    }

    #[test]
    fn test_versions_increase_per_key() {
        let store = InMemoryStore::new();
        let a = IndexKey::new("ns", "a");
        let b = IndexKey::new("ns", "b");
        let v: Vec<u32> = (0..3)
            .map(|i| {
                store
                    .add_document(&a, new_doc(vec![chunk(&format!("a{}", i), "x")], None))
                    .version
            })
            .collect();
        assert_eq!(v, vec![1, 2, 3]);
        let other = store.add_document(&b, new_doc(vec![chunk("b0", "y")], None));
        assert_eq!(other.version, 1);
    }

    #[test]
    fn test_chunks_registered_in_both_indexes() {
        let store = InMemoryStore::new();
        let key = IndexKey::new("ns", "c");
        store.add_document(
            &key,
            new_doc(vec![chunk("c1", "rust tokio"), chunk("c2", "python")], None),
        );
        let stats = store.stats();
        assert_eq!(stats.chunk_count, 2);
        assert_eq!(stats.vector_count, 2);
        assert!((stats.avg_chunk_length - 1.5).abs() < 1e-9);

        let q = HashEmbedder::default().embed("rust");
        let candidates = store.score_chunks(&key, &tokenize("rust"), &q);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].chunk().id, "c1");
        assert!(candidates[0].lexical_score > 0.0);
        assert_eq!(candidates[1].lexical_score, 0.0);
    }

    #[test]
    fn test_unknown_key_is_empty() {
        let store = InMemoryStore::new();
        let key = IndexKey::new("nope", "nothing");
        assert!(store.score_chunks(&key, &tokenize("q"), &[0.0; 4]).is_empty());
        assert!(store.collection_documents(&key).is_empty());
        assert!(store.documents(&key).is_empty());
        assert!(store.collections(None).is_empty());
        assert_eq!(store.stats(), StoreStats::default());
    }

    #[test]
    fn test_collections_sorted_and_filtered() {
        let store = InMemoryStore::new();
        store.add_document(&IndexKey::new("zeta", "a"), new_doc(vec![chunk("1", "x")], Some("en")));
        store.add_document(&IndexKey::new("alpha", "b"), new_doc(vec![chunk("2", "x")], Some("fr")));
        store.add_document(&IndexKey::new("alpha", "a"), new_doc(vec![chunk("3", "x")], Some("en")));
        store.add_document(&IndexKey::new("alpha", "a"), new_doc(vec![chunk("4", "x"), chunk("5", "y")], Some("de")));

        let all = store.collections(None);
        let keys: Vec<(&str, &str)> = all
            .iter()
            .map(|s| (s.namespace.as_str(), s.collection.as_str()))
            .collect();
        assert_eq!(keys, vec![("alpha", "a"), ("alpha", "b"), ("zeta", "a")]);

        let first = &all[0];
        assert_eq!(first.documents, 2);
        assert_eq!(first.chunks, 3);
        assert_eq!(first.latest_version, 2);
        assert_eq!(first.languages, vec!["de", "en"]);
        assert!(first.latest_ingested_at.is_some());

        let zeta = store.collections(Some("zeta"));
        assert_eq!(zeta.len(), 1);
        assert_eq!(zeta[0].namespace, "zeta");
    }

    #[test]
    fn test_collection_documents_newest_first() {
        let store = InMemoryStore::new();
        let key = IndexKey::new("ns", "docs");
        let long = "w ".repeat(400);
        store.add_document(&key, new_doc(vec![chunk("d1", long.trim())], None));
        store.add_document(&key, new_doc(vec![chunk("d2", "short text")], Some("en")));

        let previews = store.collection_documents(&key);
        assert_eq!(previews.len(), 2);
        assert_eq!(previews[0].version, 2);
        assert_eq!(previews[0].snippet, "short text");
        assert_eq!(previews[0].language.as_deref(), Some("en"));
        assert_eq!(previews[1].version, 1);
        assert_eq!(previews[1].snippet.chars().count(), SNIPPET_CHARS);
        assert_eq!(previews[1].language, None);
    }

    #[test]
    fn test_language_falls_back_to_metadata() {
        let store = InMemoryStore::new();
        let key = IndexKey::new("ns", "meta");
        let mut doc = new_doc(vec![chunk("m1", "x")], None);
        doc.metadata.insert("language".into(), "es".into());
        store.add_document(&key, doc);
        assert_eq!(store.collections(None)[0].languages, vec!["es"]);
    }
}
