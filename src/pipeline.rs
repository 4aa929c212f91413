//! Answer pipelines.
//!
//! A pipeline turns a query plus its retrieved chunks into an answer
//! string with inline citations. The built-in pipelines are templated
//! stand-ins with no model behind them; they keep the answer shape
//! stable for callers while retrieval is being tuned.

use serde::Serialize;

use archivist_core::models::SearchHit;

pub const DEFAULT_PIPELINE: &str = "qa";

/// How a pipeline should shape its answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnswerStyle {
    pub structured: bool,
    pub partial: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Pipeline {
    pub name: String,
    pub description: String,
    pub optimized: bool,
}

impl Pipeline {
    fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            optimized: false,
        }
    }

    /// Render an answer for `query` citing every hit in rank order.
    ///
    /// `structured` takes precedence over `partial` when both are set.
    pub fn run(&self, query: &str, hits: &[SearchHit], style: AnswerStyle) -> String {
        let citations: Vec<String> = hits.iter().map(citation).collect();
        let mut answer = format!("Answer for '{}' using pipeline '{}'.", query, self.name);
        if style.structured {
            answer.push_str(" Structured response.");
        } else if style.partial {
            answer.push_str(" Partial response.");
        }
        answer.push_str(" Citations: ");
        answer.push_str(&citations.join(" "));
        answer
    }
}

/// `[<source>:<first six chars of the chunk id>]`, where the source is the
/// first present of `source_file`, `source_api`, `collection`.
fn citation(hit: &SearchHit) -> String {
    let source = ["source_file", "source_api", "collection"]
        .iter()
        .find_map(|k| hit.metadata.get(*k).filter(|v| !v.is_empty()))
        .map(String::as_str)
        .unwrap_or("");
    let short: String = hit.chunk_id.chars().take(6).collect();
    format!("[{}:{}]", source, short)
}

/// The set of named pipelines. Lookups of unknown names fall back to
/// [`DEFAULT_PIPELINE`].
#[derive(Debug, Clone)]
pub struct PipelineRegistry {
    pipelines: Vec<Pipeline>,
}

impl PipelineRegistry {
    pub fn with_builtins() -> Self {
        Self {
            pipelines: vec![
                Pipeline::new("qa", "QA with citations"),
                Pipeline::new("reasoning", "Multi-step reasoning"),
                Pipeline::new("routing", "Query routing"),
                Pipeline::new("extraction", "Structured extraction/classification"),
            ],
        }
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    fn position(&self, name: Option<&str>) -> usize {
        name.and_then(|n| self.pipelines.iter().position(|p| p.name == n))
            .or_else(|| self.pipelines.iter().position(|p| p.name == DEFAULT_PIPELINE))
            .unwrap_or(0)
    }

    pub fn get(&self, name: Option<&str>) -> &Pipeline {
        &self.pipelines[self.position(name)]
    }

    /// Mark a pipeline as optimized.
    pub fn optimize(&mut self, name: &str) {
        let idx = self.position(Some(name));
        self.pipelines[idx].optimized = true;
    }
}

impl Default for PipelineRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archivist_core::models::Metadata;

    fn hit(id: &str, meta: &[(&str, &str)]) -> SearchHit {
        SearchHit {
            chunk_id: id.to_string(),
            document_id: "doc".to_string(),
            text: "text".to_string(),
            metadata: meta
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Metadata>(),
            score: 1.0,
            lexical_score: 1.0,
            vector_score: 1.0,
        }
    }

    #[test]
    fn test_answer_with_citations() {
        let registry = PipelineRegistry::with_builtins();
        let hits = vec![
            hit("abcdef123456", &[("source_file", "a.md"), ("collection", "kb")]),
            hit("0123456789", &[("source_api", "tickets"), ("collection", "kb")]),
            hit("ffeedd", &[("collection", "kb")]),
        ];
        let answer = registry.get(None).run("why", &hits, AnswerStyle::default());
        assert_eq!(
            answer,
            "Answer for 'why' using pipeline 'qa'. Citations: [a.md:abcdef] [tickets:012345] [kb:ffeedd]"
        );
    }

    #[test]
    fn test_styles() {
        let registry = PipelineRegistry::with_builtins();
        let p = registry.get(Some("reasoning"));
        let structured = p.run(
            "q",
            &[],
            AnswerStyle {
                structured: true,
                partial: true,
            },
        );
        assert_eq!(
            structured,
            "Answer for 'q' using pipeline 'reasoning'. Structured response. Citations: "
        );
        let partial = p.run(
            "q",
            &[],
            AnswerStyle {
                structured: false,
                partial: true,
            },
        );
        assert!(partial.contains(" Partial response."));
    }

    #[test]
    fn test_unknown_falls_back_to_qa() {
        let mut registry = PipelineRegistry::with_builtins();
        assert_eq!(registry.get(Some("nope")).name, "qa");
        assert_eq!(registry.get(Some("routing")).name, "routing");
        assert_eq!(registry.pipelines().len(), 4);

        registry.optimize("extraction");
        assert!(registry.get(Some("extraction")).optimized);
        registry.optimize("nope");
        assert!(registry.get(None).optimized);
        assert!(!registry.get(Some("routing")).optimized);
    }
}
