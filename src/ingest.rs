//! Loading inputs into an engine.
//!
//! Plain files become one document each with `source_file` metadata.
//! Each archive entry becomes its own document tagged with `archive` and
//! `source_file`. Counts come from the returned documents, so they stay
//! exact while other writers share the engine.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use archivist_core::engine::Engine;
use archivist_core::ingest::archive_entry_metadata;
use archivist_core::models::{IndexKey, Metadata};
use archivist_core::store::Store;

use crate::config::LoaderConfig;
use crate::loader::{load_inputs, LoadedInput};

/// Counts for one load run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub inputs: usize,
    pub documents: usize,
    pub chunks: usize,
}

/// Ingest every already-loaded input into `key`.
pub fn ingest_inputs<S: Store + ?Sized>(
    engine: &Engine<S>,
    key: &IndexKey,
    inputs: Vec<LoadedInput>,
) -> Result<IngestSummary> {
    let mut summary = IngestSummary::default();

    for input in inputs {
        summary.inputs += 1;
        match input {
            LoadedInput::Text { name, content } => {
                let mut metadata = Metadata::new();
                metadata.insert("source_file".to_string(), name.clone());
                let doc = engine
                    .ingest(key, &content, &metadata, None, None)
                    .with_context(|| format!("Failed to ingest {}", name))?;
                summary.documents += 1;
                summary.chunks += doc.chunks.len();
            }
            LoadedInput::Archive { name, entries } => {
                for (entry, content) in entries {
                    let metadata = archive_entry_metadata(&name, &entry, &Metadata::new());
                    let doc = engine
                        .ingest(key, &content, &metadata, None, None)
                        .with_context(|| format!("Failed to ingest {} from {}", entry, name))?;
                    summary.documents += 1;
                    summary.chunks += doc.chunks.len();
                }
            }
        }
    }

    info!(
        key = %key,
        inputs = summary.inputs,
        documents = summary.documents,
        chunks = summary.chunks,
        "load complete"
    );
    Ok(summary)
}

/// Load `paths` from disk and ingest them into `key`.
pub fn load_paths<S: Store + ?Sized>(
    engine: &Engine<S>,
    key: &IndexKey,
    paths: &[PathBuf],
    config: &LoaderConfig,
) -> Result<IngestSummary> {
    let inputs = load_inputs(paths, config)?;
    ingest_inputs(engine, key, inputs)
}
