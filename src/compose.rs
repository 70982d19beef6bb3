//! Grounded answer composition.
//!
//! Builds a context-restricted prompt from retrieved chunks, invokes the
//! language model once, and attaches citations derived from the chunks that
//! went into the prompt. The composer never raises toward the UI layer: an
//! empty retrieval yields the fixed insufficient-information answer without
//! a model call, and a failed model call degrades to error-described text.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::store::ScoredChunk;

pub const INSUFFICIENT_INFORMATION: &str =
    "I don't have enough information to answer this question.";

/// A model answer restricted to retrieved context, with traceable citations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundedAnswer {
    pub answer_text: String,
    /// Distinct section titles of the chunks used to build the prompt, in
    /// retrieval order. Never fabricated independent of retrieval results.
    pub citations: Vec<String>,
}

impl GroundedAnswer {
    /// Render the answer with a citation line, the shape front ends print.
    pub fn display(&self) -> String {
        if self.citations.is_empty() {
            return self.answer_text.clone();
        }
        let citation_line = self
            .citations
            .iter()
            .map(|title| format!("From '{}'", title))
            .collect::<Vec<_>>()
            .join(" ");
        format!("{}\n\nCitations: {}", self.answer_text, citation_line)
    }
}

#[derive(Debug, Clone)]
pub struct ComposerConfig {
    pub temperature: Option<f64>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            temperature: Some(0.3),
        }
    }
}

pub struct AnswerComposer {
    provider: Arc<dyn LlmProvider>,
    config: ComposerConfig,
}

impl AnswerComposer {
    pub fn new(provider: Arc<dyn LlmProvider>, config: ComposerConfig) -> Self {
        Self { provider, config }
    }

    /// Compose a grounded answer for `query` from `retrieved` chunks.
    pub async fn compose(&self, query: &str, retrieved: &[ScoredChunk]) -> GroundedAnswer {
        if retrieved.is_empty() {
            return GroundedAnswer {
                answer_text: INSUFFICIENT_INFORMATION.to_string(),
                citations: Vec::new(),
            };
        }

        let context = retrieved
            .iter()
            .map(|scored| scored.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = build_grounded_prompt(&context, query);
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(self.config.temperature);

        let answer_text = match self.provider.chat(request).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(error = %err, "composer model call failed");
                format!("Error processing query: {}", err)
            }
        };

        GroundedAnswer {
            answer_text,
            citations: citations_for(retrieved),
        }
    }
}

/// Distinct section titles in retrieval order.
fn citations_for(retrieved: &[ScoredChunk]) -> Vec<String> {
    let mut citations: Vec<String> = Vec::new();
    for scored in retrieved {
        let title = &scored.chunk.section_title;
        if !citations.iter().any(|seen| seen == title) {
            citations.push(title.clone());
        }
    }
    citations
}

fn build_grounded_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful educator answering questions from a supplied document.\n\n\
         Instructions:\n\
         - Use ONLY the information provided in the context to answer the question\n\
         - If the context contains relevant information, provide a comprehensive and accurate answer\n\
         - If the context doesn't contain enough information, say '{}'\n\
         - Be specific, and include relevant examples and technical details when available\n\n\
         Context:\n{}\n\n\
         Question: {}\n\n\
         Answer:",
        INSUFFICIENT_INFORMATION, context, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::DocumentChunk;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        chat_calls: AtomicUsize,
        fail: bool,
    }

    impl CountingProvider {
        fn new(fail: bool) -> Self {
            Self {
                chat_calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl LlmProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        async fn health_check(&self) -> Result<bool, crate::core::errors::PipelineError> {
            Ok(true)
        }

        async fn chat(
            &self,
            _request: ChatRequest,
        ) -> Result<String, crate::core::errors::PipelineError> {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(crate::core::errors::PipelineError::Provider(
                    "model offline".to_string(),
                ))
            } else {
                Ok("Grounded answer.".to_string())
            }
        }

        async fn embed(
            &self,
            _inputs: &[String],
        ) -> Result<Vec<Vec<f32>>, crate::core::errors::PipelineError> {
            Ok(Vec::new())
        }
    }

    fn scored(section: &str, index: usize) -> ScoredChunk {
        ScoredChunk {
            chunk: DocumentChunk {
                text: format!("chunk text {}", index),
                section_title: section.to_string(),
                source_id: "doc".to_string(),
                sequence_index: index,
            },
            score: 1.0 - index as f32 * 0.1,
        }
    }

    #[tokio::test]
    async fn empty_retrieval_skips_model_call() {
        let provider = Arc::new(CountingProvider::new(false));
        let composer = AnswerComposer::new(provider.clone(), ComposerConfig::default());

        let answer = composer.compose("what is a robot?", &[]).await;

        assert_eq!(answer.answer_text, INSUFFICIENT_INFORMATION);
        assert!(answer.citations.is_empty());
        assert_eq!(provider.chat_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn citations_are_distinct_and_order_preserving() {
        let provider = Arc::new(CountingProvider::new(false));
        let composer = AnswerComposer::new(provider, ComposerConfig::default());

        let retrieved = vec![
            scored("Sensing", 0),
            scored("Actuation", 1),
            scored("Sensing", 2),
            scored("Locomotion", 3),
        ];
        let answer = composer.compose("how do robots move?", &retrieved).await;

        assert_eq!(answer.citations, vec!["Sensing", "Actuation", "Locomotion"]);
    }

    #[tokio::test]
    async fn model_failure_degrades_to_error_text() {
        let provider = Arc::new(CountingProvider::new(true));
        let composer = AnswerComposer::new(provider, ComposerConfig::default());

        let answer = composer.compose("query", &[scored("Sensing", 0)]).await;

        assert!(answer.answer_text.starts_with("Error processing query:"));
        assert_eq!(answer.citations, vec!["Sensing"]);
    }

    #[test]
    fn display_appends_citation_line() {
        let answer = GroundedAnswer {
            answer_text: "Robots move.".to_string(),
            citations: vec!["Locomotion".to_string()],
        };
        assert_eq!(answer.display(), "Robots move.\n\nCitations: From 'Locomotion'");
    }
}
