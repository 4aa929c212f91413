//! The engine facade: the operations a serving layer calls.
//!
//! An [`Engine`] owns the store, the embedder, the ingestion orchestrator
//! and the metrics log. It is created once per process and shared by
//! reference (or `Arc`) across threads; every method takes `&self`.
//!
//! | Method | Operation |
//! |--------|-----------|
//! | [`ingest`](Engine::ingest) | `Ingest` |
//! | [`ingest_archive`](Engine::ingest_archive) | `Ingest` for pre-expanded archives |
//! | [`search`](Engine::search) | `Search` |
//! | [`stats`](Engine::stats) | `Stats` |
//! | [`list_collections`](Engine::list_collections) | `ListCollections` |
//! | [`list_documents`](Engine::list_documents) | `ListDocuments` |
//! | [`log_query`](Engine::log_query) | `LogQuery` |
//! | [`recent_queries`](Engine::recent_queries) | `RecentQueries` |

use std::sync::Arc;

use serde::Serialize;

use crate::chunk::ChunkingParams;
use crate::embedding::{Embedder, HashEmbedder, DEFAULT_DIMS};
use crate::error::Result;
use crate::ingest::{IngestRequest, Ingestor};
use crate::metrics::{MetricsLog, QueryRecord, DEFAULT_CAPACITY, DEFAULT_LATENCY_WINDOW};
use crate::models::{
    CollectionSummary, Document, DocumentPreview, IndexKey, Metadata, SearchHit, StoreStats,
};
use crate::search::{search, Filters, SearchParams, SearchRequest, DEFAULT_TOP_K};
use crate::store::memory::InMemoryStore;
use crate::store::Store;

/// Engine tuning, decoupled from the application's config file format.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub chunking: ChunkingParams,
    pub dims: usize,
    pub search: SearchParams,
    pub top_k: usize,
    pub metrics_capacity: usize,
    pub latency_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingParams::default(),
            dims: DEFAULT_DIMS,
            search: SearchParams::default(),
            top_k: DEFAULT_TOP_K,
            metrics_capacity: DEFAULT_CAPACITY,
            latency_window: DEFAULT_LATENCY_WINDOW,
        }
    }
}

/// Store totals plus query metrics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    #[serde(flatten)]
    pub stats: StoreStats,
    /// Rolling average over the most recent queries.
    pub latency_ms: f64,
    pub tokens_used: u64,
    pub latest_queries: Vec<QueryRecord>,
}

pub struct Engine<S: Store + ?Sized = InMemoryStore> {
    store: Arc<S>,
    embedder: Arc<dyn Embedder>,
    ingestor: Ingestor<S>,
    params: SearchParams,
    default_top_k: usize,
    metrics: MetricsLog,
}

impl Engine<InMemoryStore> {
    /// An engine over a fresh [`InMemoryStore`] and a [`HashEmbedder`].
    pub fn new(config: EngineConfig) -> Result<Self> {
        let embedder = Arc::new(HashEmbedder::new(config.dims)?);
        Self::with_store(Arc::new(InMemoryStore::new()), embedder, config)
    }
}

impl<S: Store + ?Sized> Engine<S> {
    pub fn with_store(
        store: Arc<S>,
        embedder: Arc<dyn Embedder>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.chunking.validate()?;
        let metrics = MetricsLog::new(config.metrics_capacity, config.latency_window)?;
        let ingestor = Ingestor::new(Arc::clone(&store), Arc::clone(&embedder), config.chunking);
        Ok(Self {
            store,
            embedder,
            ingestor,
            params: config.search,
            default_top_k: config.top_k,
            metrics,
        })
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn ingest(
        &self,
        key: &IndexKey,
        content: &str,
        metadata: &Metadata,
        chunk_size: Option<usize>,
        chunk_overlap: Option<usize>,
    ) -> Result<Arc<Document>> {
        self.ingestor.ingest(&IngestRequest {
            key,
            content,
            metadata,
            chunk_size,
            chunk_overlap,
        })
    }

    /// See [`Ingestor::ingest_archive`]: returns only the last document.
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
        self.ingestor
            .ingest_archive(key, archive_name, entries, metadata, chunk_size, chunk_overlap)
    }

    /// Hybrid search; `top_k` defaults to the configured value.
    pub fn search(
        &self,
        key: &IndexKey,
        query: &str,
        top_k: Option<usize>,
        filters: &Filters,
    ) -> Vec<SearchHit> {
        let req = SearchRequest {
            key,
            query,
            top_k: top_k.unwrap_or(self.default_top_k),
            filters,
        };
        search(self.store.as_ref(), self.embedder.as_ref(), &self.params, &req)
    }

    /// Re-run a query with default `top_k` and no filters, without logging.
    pub fn replay(&self, key: &IndexKey, query: &str) -> Vec<SearchHit> {
        self.search(key, query, None, &Filters::new())
    }

    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    pub fn list_collections(&self, namespace: Option<&str>) -> Vec<CollectionSummary> {
        self.store.collections(namespace)
    }

    pub fn list_documents(&self, key: &IndexKey) -> Vec<DocumentPreview> {
        self.store.collection_documents(key)
    }

    pub fn documents(&self, key: &IndexKey) -> Vec<Arc<Document>> {
        self.store.documents(key)
    }

    pub fn log_query(&self, record: QueryRecord) {
        self.metrics.log_query(record);
    }

    /// Retained query records, oldest first.
    pub fn recent_queries(&self) -> Vec<QueryRecord> {
        self.metrics.recent_queries()
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            stats: self.stats(),
            latency_ms: self.metrics.average_latency_ms(),
            tokens_used: self.metrics.total_tokens(),
            latest_queries: self.metrics.recent_queries(),
        }
    }
}
