//! TOML configuration parsing.
//!
//! Every section and field is optional; omitted values fall back to the
//! defaults below. `ARCHIVIST_*` environment variables override the file
//! before validation.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use archivist_core::chunk::ChunkingParams;
use archivist_core::engine::EngineConfig;
use archivist_core::search::SearchParams;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DefaultsConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            collection: default_collection(),
        }
    }
}

fn default_namespace() -> String {
    "default".to_string()
}
fn default_collection() -> String {
    "default".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Words per window; `0` disables chunking.
    #[serde(default = "default_chunk_size")]
    pub size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    800
}
fn default_chunk_overlap() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_dims")]
    pub dims: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dims: default_dims(),
        }
    }
}

fn default_dims() -> usize {
    128
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f64,
    #[serde(default = "default_lexical_weight")]
    pub lexical_weight: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            vector_weight: default_vector_weight(),
            lexical_weight: default_lexical_weight(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_vector_weight() -> f64 {
    0.6
}
fn default_lexical_weight() -> f64 {
    0.4
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_latency_window")]
    pub latency_window: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            latency_window: default_latency_window(),
        }
    }
}

fn default_capacity() -> usize {
    1000
}
fn default_latency_window() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoaderConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    [
        "**/*.md", "**/*.txt", "**/*.csv", "**/*.json", "**/*.html", "**/*.zip",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Config {
    /// Engine tuning derived from this config.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            chunking: ChunkingParams::new(self.chunking.size, self.chunking.overlap),
            dims: self.embedding.dims,
            search: SearchParams {
                vector_weight: self.retrieval.vector_weight,
                lexical_weight: self.retrieval.lexical_weight,
            },
            top_k: self.retrieval.top_k,
            metrics_capacity: self.metrics.capacity,
            latency_window: self.metrics.latency_window,
        }
    }

    /// Apply `ARCHIVIST_*` environment overrides.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ARCHIVIST_CHUNK_SIZE") {
            self.chunking.size = v
                .parse()
                .with_context(|| format!("ARCHIVIST_CHUNK_SIZE is not an integer: {}", v))?;
        }
        if let Some(v) = lookup("ARCHIVIST_CHUNK_OVERLAP") {
            self.chunking.overlap = v
                .parse()
                .with_context(|| format!("ARCHIVIST_CHUNK_OVERLAP is not an integer: {}", v))?;
        }
        if let Some(v) = lookup("ARCHIVIST_METRICS_WINDOW") {
            self.metrics.capacity = v
                .parse()
                .with_context(|| format!("ARCHIVIST_METRICS_WINDOW is not an integer: {}", v))?;
        }
        if let Some(v) = lookup("ARCHIVIST_DEFAULT_NAMESPACE") {
            self.defaults.namespace = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.size > 0 && self.chunking.overlap >= self.chunking.size {
            bail!(
                "chunking.overlap ({}) must be < chunking.size ({})",
                self.chunking.overlap,
                self.chunking.size
            );
        }

        if self.embedding.dims == 0 {
            bail!("embedding.dims must be > 0");
        }

        if self.retrieval.top_k < 1 {
            bail!("retrieval.top_k must be >= 1");
        }

        if self.metrics.capacity < 1 {
            bail!("metrics.capacity must be >= 1");
        }
        if self.metrics.latency_window < 1 {
            bail!("metrics.latency_window must be >= 1");
        }

        if self.defaults.namespace.is_empty() || self.defaults.collection.is_empty() {
            bail!("defaults.namespace and defaults.collection must be non-empty");
        }

        Ok(())
    }
}

/// Load config from `path` (or defaults when `None`), apply environment
/// overrides, and validate.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => parse_config_file(path)?,
        None => Config::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&content).with_context(|| "Failed to parse config file")
}

/// Default config location, used only when it exists.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("./config/archivist.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.chunking.size, 800);
        assert_eq!(config.chunking.overlap, 100);
        assert_eq!(config.embedding.dims, 128);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.metrics.capacity, 1000);
        assert_eq!(config.defaults.namespace, "default");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [chunking]
            size = 50

            [retrieval]
            vector_weight = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.chunking.size, 50);
        assert_eq!(config.chunking.overlap, 100);
        assert!((config.retrieval.lexical_weight - 0.4).abs() < 1e-12);
        assert!(config.validate().is_err());

        let engine = config.engine_config();
        assert_eq!(engine.chunking.size, 50);
        assert!((engine.search.vector_weight - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("ARCHIVIST_CHUNK_SIZE", "20"),
            ("ARCHIVIST_CHUNK_OVERLAP", "5"),
            ("ARCHIVIST_DEFAULT_NAMESPACE", "tenant-a"),
            ("ARCHIVIST_METRICS_WINDOW", "10"),
        ]);
        let mut config = Config::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.chunking.size, 20);
        assert_eq!(config.chunking.overlap, 5);
        assert_eq!(config.defaults.namespace, "tenant-a");
        assert_eq!(config.metrics.capacity, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = Config::default();
        let err = config
            .apply_env(|k| (k == "ARCHIVIST_CHUNK_SIZE").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("ARCHIVIST_CHUNK_SIZE"));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.embedding.dims = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.chunking.size = 0;
        config.chunking.overlap = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_errors() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
