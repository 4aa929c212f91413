//! # Archivist CLI (`archivist`)
//!
//! Loads the given inputs into an in-memory engine, runs one command
//! against it, and prints the result as JSON on stdout. Logs go to stderr.
//!
//! ```bash
//! archivist --path ./docs --collection guides search "rollback"
//! archivist --path ./bundle.zip ask "how do I rotate keys" --pipeline reasoning
//! archivist --path ./docs collections
//! archivist --path ./docs replay "rollback"
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use archivist::config::{default_config_path, load_config, Config};
use archivist::ingest::load_paths;
use archivist::pipeline::{AnswerStyle, PipelineRegistry};
use archivist::query::{run_query, ChatMessage, QueryRequest};
use archivist_core::engine::Engine;
use archivist_core::models::IndexKey;
use archivist_core::search::Filters;

/// Archivist: ingest text and archives, then search or ask over them.
#[derive(Parser)]
#[command(name = "archivist", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/archivist.toml` when that file exists,
    /// otherwise built-in defaults are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// File, directory or `.zip` to load before running the command.
    #[arg(long = "path", global = true)]
    paths: Vec<PathBuf>,

    /// Namespace to load into and query (defaults to `[defaults].namespace`).
    #[arg(long, global = true)]
    namespace: Option<String>,

    /// Collection to load into and query (defaults to `[defaults].collection`).
    #[arg(long, global = true)]
    collection: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hybrid search; prints the ranked chunks.
    Search {
        query: String,

        /// Maximum number of results.
        #[arg(long)]
        top_k: Option<usize>,

        /// Exact-match metadata filter (KEY=VALUE), repeatable.
        #[arg(long = "filter", value_parser = parse_key_val)]
        filters: Vec<(String, String)>,
    },

    /// Re-run a query with the default top_k and no filters, without
    /// recording it in the query log.
    Replay { query: String },

    /// Search and answer with a pipeline.
    Ask {
        query: String,

        /// Pipeline name: qa, reasoning, routing, extraction.
        #[arg(long)]
        pipeline: Option<String>,

        /// Return the chunks only, with an empty answer.
        #[arg(long)]
        retrieval_only: bool,

        #[arg(long)]
        structured: bool,

        #[arg(long)]
        partial: bool,

        /// Earlier chat message, repeatable; prepended to the query.
        #[arg(long = "history")]
        history: Vec<String>,

        #[arg(long)]
        top_k: Option<usize>,

        #[arg(long = "filter", value_parser = parse_key_val)]
        filters: Vec<(String, String)>,
    },

    /// Summaries of every non-empty collection, optionally within `--namespace`.
    Collections,

    /// Previews of the documents in the selected collection, newest first.
    Documents,

    /// Store totals and query metrics.
    Stats,

    /// Available answer pipelines.
    Pipelines {
        /// Mark this pipeline as optimized before listing.
        #[arg(long)]
        optimize: Option<String>,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("archivist=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => load_config(Some(path.as_path())),
        None => {
            let default = default_config_path();
            if default.exists() {
                load_config(Some(default.as_path()))
            } else {
                load_config(None)
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_ref())?;
    let engine = Engine::new(config.engine_config()).context("Invalid engine configuration")?;

    let key = IndexKey::new(
        cli.namespace
            .clone()
            .unwrap_or_else(|| config.defaults.namespace.clone()),
        cli.collection
            .clone()
            .unwrap_or_else(|| config.defaults.collection.clone()),
    );

    if !cli.paths.is_empty() {
        load_paths(&engine, &key, &cli.paths, &config.loader)?;
    }

    let mut pipelines = PipelineRegistry::with_builtins();

    match cli.command {
        Commands::Search {
            query,
            top_k,
            filters,
        } => {
            let request = QueryRequest {
                namespace: Some(key.namespace.clone()),
                collection: Some(key.collection.clone()),
                filters: filters.into_iter().collect::<Filters>(),
                top_k,
                retrieval_only: true,
                ..QueryRequest::new(query)
            };
            let response = run_query(&engine, &pipelines, &config.defaults, &request);
            print_json(&response.chunks)?;
        }
        Commands::Replay { query } => {
            print_json(&engine.replay(&key, &query))?;
        }
        Commands::Ask {
            query,
            pipeline,
            retrieval_only,
            structured,
            partial,
            history,
            top_k,
            filters,
        } => {
            let request = QueryRequest {
                namespace: Some(key.namespace.clone()),
                collection: Some(key.collection.clone()),
                filters: filters.into_iter().collect::<Filters>(),
                top_k,
                pipeline,
                retrieval_only,
                style: AnswerStyle {
                    structured,
                    partial,
                },
                history: history
                    .into_iter()
                    .map(|content| ChatMessage {
                        role: "user".to_string(),
                        content,
                    })
                    .collect(),
                ..QueryRequest::new(query)
            };
            let response = run_query(&engine, &pipelines, &config.defaults, &request);
            print_json(&response)?;
        }
        Commands::Collections => {
            print_json(&engine.list_collections(cli.namespace.as_deref()))?;
        }
        Commands::Documents => {
            print_json(&engine.list_documents(&key))?;
        }
        Commands::Stats => {
            print_json(&engine.metrics_snapshot())?;
        }
        Commands::Pipelines { optimize } => {
            if let Some(name) = optimize {
                pipelines.optimize(&name);
            }
            print_json(&pipelines.pipelines())?;
        }
    }

    Ok(())
}
