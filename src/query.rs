//! Query execution: search, answer, record.
//!
//! [`run_query`] is the one path every question takes. It resolves the
//! namespace and collection defaults, times the hybrid search, hands the
//! hits to the selected answer pipeline (unless retrieval-only), and logs
//! a [`QueryRecord`] with the elapsed time and the query's token count.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use archivist_core::engine::Engine;
use archivist_core::metrics::QueryRecord;
use archivist_core::models::{IndexKey, SearchHit};
use archivist_core::normalize::tokenize;
use archivist_core::search::Filters;
use archivist_core::store::Store;

use crate::config::DefaultsConfig;
use crate::pipeline::{AnswerStyle, PipelineRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub query: String,
    pub namespace: Option<String>,
    pub collection: Option<String>,
    pub filters: Filters,
    pub top_k: Option<usize>,
    pub pipeline: Option<String>,
    pub retrieval_only: bool,
    pub style: AnswerStyle,
    /// Prior chat turns; their contents are prepended to the query.
    pub history: Vec<ChatMessage>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// The text actually searched: history contents then the query,
    /// space separated.
    pub fn effective_query(&self) -> String {
        if self.history.is_empty() {
            return self.query.clone();
        }
        let mut parts: Vec<&str> = self.history.iter().map(|m| m.content.as_str()).collect();
        parts.push(&self.query);
        parts.join(" ")
    }

    pub fn key(&self, defaults: &DefaultsConfig) -> IndexKey {
        IndexKey::new(
            self.namespace
                .clone()
                .unwrap_or_else(|| defaults.namespace.clone()),
            self.collection
                .clone()
                .unwrap_or_else(|| defaults.collection.clone()),
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    /// Empty when the request was retrieval-only.
    pub answer: String,
    pub chunks: Vec<SearchHit>,
}

pub fn run_query<S: Store + ?Sized>(
    engine: &Engine<S>,
    pipelines: &PipelineRegistry,
    defaults: &DefaultsConfig,
    request: &QueryRequest,
) -> QueryResponse {
    let key = request.key(defaults);
    let query = request.effective_query();

    let start = Instant::now();
    let chunks = engine.search(&key, &query, request.top_k, &request.filters);

    let answer = if request.retrieval_only {
        String::new()
    } else {
        let pipeline = pipelines.get(request.pipeline.as_deref());
        pipeline.run(&query, &chunks, request.style)
    };
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    let tokens = tokenize(&query).len();
    debug!(
        key = %key,
        results = chunks.len(),
        latency_ms,
        "query executed"
    );
    engine.log_query(QueryRecord::new(query, latency_ms, tokens, &key));

    QueryResponse { answer, chunks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archivist_core::engine::EngineConfig;
    use archivist_core::models::Metadata;

    fn engine_with(docs: &[(&str, &str)]) -> Engine {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        for (collection, text) in docs {
            engine
                .ingest(
                    &IndexKey::new("default", *collection),
                    text,
                    &Metadata::new(),
                    None,
                    None,
                )
                .unwrap();
        }
        engine
    }

    #[test]
    fn test_defaults_and_metrics() {
        let engine = engine_with(&[("default", "postgres vacuum tuning guide")]);
        let pipelines = PipelineRegistry::with_builtins();
        let defaults = DefaultsConfig::default();

        let response = run_query(
            &engine,
            &pipelines,
            &defaults,
            &QueryRequest::new("postgres vacuum"),
        );
        assert_eq!(response.chunks.len(), 1);
        assert!(response
            .answer
            .starts_with("Answer for 'postgres vacuum' using pipeline 'qa'."));
        assert!(response.answer.contains("[default:"));

        let recent = engine.recent_queries();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].query, "postgres vacuum");
        assert_eq!(recent[0].tokens, 2);
        assert_eq!(recent[0].namespace, "default");
        assert_eq!(recent[0].collection, "default");
        assert!(recent[0].latency_ms >= 0.0);
    }

    #[test]
    fn test_retrieval_only_skips_answer() {
        let engine = engine_with(&[("kb", "rust ownership")]);
        let pipelines = PipelineRegistry::with_builtins();
        let request = QueryRequest {
            collection: Some("kb".to_string()),
            retrieval_only: true,
            ..QueryRequest::new("ownership")
        };
        let response = run_query(&engine, &pipelines, &DefaultsConfig::default(), &request);
        assert!(response.answer.is_empty());
        assert_eq!(response.chunks.len(), 1);
        assert_eq!(engine.metrics_snapshot().tokens_used, 1);
    }

    #[test]
    fn test_chat_history_is_prepended() {
        let request = QueryRequest {
            history: vec![
                ChatMessage {
                    role: "user".to_string(),
                    content: "tell me about tokio".to_string(),
                },
                ChatMessage {
                    role: "assistant".to_string(),
                    content: "it is a runtime".to_string(),
                },
            ],
            ..QueryRequest::new("how do tasks work")
        };
        assert_eq!(
            request.effective_query(),
            "tell me about tokio it is a runtime how do tasks work"
        );

        let engine = engine_with(&[("default", "tokio tasks are lightweight")]);
        run_query(
            &engine,
            &PipelineRegistry::with_builtins(),
            &DefaultsConfig::default(),
            &request,
        );
        assert_eq!(engine.recent_queries()[0].tokens, 12);
    }

    #[test]
    fn test_filters_and_pipeline_selection() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let key = IndexKey::new("default", "default");
        let meta: Metadata = [("team".to_string(), "infra".to_string())].into();
        engine.ingest(&key, "terraform modules", &meta, None, None).unwrap();
        engine
            .ingest(&key, "terraform state locking", &Metadata::new(), None, None)
            .unwrap();

        let request = QueryRequest {
            filters: Filters::new().with("team", "infra"),
            pipeline: Some("extraction".to_string()),
            ..QueryRequest::new("terraform")
        };
        let response = run_query(
            &engine,
            &PipelineRegistry::with_builtins(),
            &DefaultsConfig::default(),
            &request,
        );
        assert_eq!(response.chunks.len(), 1);
        assert_eq!(response.chunks[0].text, "terraform modules");
        assert!(response.answer.contains("pipeline 'extraction'"));
    }
}
