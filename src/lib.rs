//! # Archivist
//!
//! The application layer around [`archivist_core`]: configuration, input
//! loading, answer pipelines and query execution. The `archivist` binary
//! wires these together into a one-shot CLI over an in-memory engine.
//!
//! ```text
//! ┌────────────┐   ┌──────────────────────────┐   ┌────────────┐
//! │  loader    │──▶│ archivist-core Engine    │──▶│   query    │
//! │ files/zip  │   │ chunk+embed, BM25+vector │   │ + pipeline │
//! └────────────┘   └──────────────────────────┘   └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration with env overrides |
//! | [`loader`] | Files, directories and zip archives to text |
//! | [`ingest`] | Feeding loaded inputs to the engine |
//! | [`pipeline`] | Answer pipelines with citations |
//! | [`query`] | Timed query execution and metrics recording |

pub mod config;
pub mod ingest;
pub mod loader;
pub mod pipeline;
pub mod query;
