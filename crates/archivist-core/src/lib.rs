//! # Archivist Core
//!
//! The ingestion-and-retrieval engine behind Archivist: normalization,
//! word-window chunking, deterministic hashing embeddings, per
//! `(namespace, collection)` BM25 and vector indexes, a versioned
//! append-only document store, hybrid ranking, and a bounded query log.
//!
//! This crate performs no filesystem or network I/O. Loaders hand it
//! cleaned text plus metadata; it hands back documents and ranked chunks.
//!
//! ```rust
//! use archivist_core::engine::{Engine, EngineConfig};
//! use archivist_core::models::{IndexKey, Metadata};
//! use archivist_core::search::Filters;
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let key = IndexKey::new("default", "notes");
//! engine
//!     .ingest(&key, "Tokio is an async runtime for Rust.", &Metadata::new(), None, None)
//!     .unwrap();
//! let hits = engine.search(&key, "async runtime", None, &Filters::new());
//! assert_eq!(hits.len(), 1);
//! ```

pub mod chunk;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod search;
pub mod store;

pub use error::{CoreError, Result};
