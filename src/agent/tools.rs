//! Tool registry.
//!
//! A tool is a named capability the model may invoke during a turn. The
//! registry is typed and fixed at construction; the model only ever selects
//! by name from what the registry advertises.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::compose::AnswerComposer;
use crate::core::errors::PipelineError;
use crate::retrieve::Retriever;
use crate::segment::DocumentChunk;
use crate::summarize::Summarizer;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn call(&self, args: &Value) -> Result<String, PipelineError>;
}

#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    /// One `name: description` line per tool, for the dispatch prompt.
    pub fn describe(&self) -> String {
        self.tools
            .iter()
            .map(|tool| format!("- {}: {}", tool.name(), tool.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Answers a question from the indexed documents with citations.
pub struct DocumentQaTool {
    retriever: Arc<Retriever>,
    composer: Arc<AnswerComposer>,
}

impl DocumentQaTool {
    pub fn new(retriever: Arc<Retriever>, composer: Arc<AnswerComposer>) -> Self {
        Self {
            retriever,
            composer,
        }
    }
}

#[async_trait]
impl Tool for DocumentQaTool {
    fn name(&self) -> &str {
        "document_qa"
    }

    fn description(&self) -> &str {
        "Answer a question using the indexed documents, with citations. \
         Args: {\"query\": \"...\"}"
    }

    async fn call(&self, args: &Value) -> Result<String, PipelineError> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PipelineError::tool(self.name(), "missing `query` argument"))?;

        let retrieved = self.retriever.retrieve_default(query).await?;
        let answer = self.composer.compose(query, &retrieved).await;
        Ok(answer.display())
    }
}

/// Runs one of the summarizer analyses over the loaded document.
pub struct ReportAnalysisTool {
    summarizer: Arc<Summarizer>,
    chunks: Arc<Vec<DocumentChunk>>,
}

impl ReportAnalysisTool {
    pub fn new(summarizer: Arc<Summarizer>, chunks: Arc<Vec<DocumentChunk>>) -> Self {
        Self { summarizer, chunks }
    }
}

#[async_trait]
impl Tool for ReportAnalysisTool {
    fn name(&self) -> &str {
        "report_analysis"
    }

    fn description(&self) -> &str {
        "Run a structured analysis of the loaded document. \
         Args: {\"analysis\": \"summary\" | \"outcomes\" | \"feedback\" | \"recommendations\"}"
    }

    async fn call(&self, args: &Value) -> Result<String, PipelineError> {
        let analysis = args
            .get("analysis")
            .and_then(|v| v.as_str())
            .unwrap_or("summary");

        let result = match analysis {
            "summary" => self.summarizer.executive_summary(&self.chunks).await,
            "outcomes" => self.summarizer.analyze_outcomes(&self.chunks).await,
            "feedback" => self.summarizer.analyze_feedback(&self.chunks).await,
            "recommendations" => self.summarizer.recommendations(&self.chunks).await,
            other => {
                return Err(PipelineError::tool(
                    self.name(),
                    format!("unknown analysis `{}`", other),
                ))
            }
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "a test tool"
        }

        async fn call(&self, _args: &Value) -> Result<String, PipelineError> {
            Ok("ok".to_string())
        }
    }

    #[test]
    fn registry_lookup_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NamedTool("alpha")));
        registry.register(Arc::new(NamedTool("beta")));

        assert!(registry.get("alpha").is_some());
        assert!(registry.get("gamma").is_none());
        assert_eq!(registry.names(), vec!["alpha", "beta"]);
    }

    #[test]
    fn describe_lists_every_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NamedTool("alpha")));
        let description = registry.describe();
        assert!(description.contains("- alpha: a test tool"));
    }
}
