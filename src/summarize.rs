//! Document summarization.
//!
//! Structured analyses over a document's chunks: executive summary, outcomes,
//! feedback, recommendations, and a combined markdown report. Each analysis
//! is one grounded model call; like the composer, a failed call degrades to
//! error text so the result is always renderable.

use std::sync::Arc;

use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::segment::DocumentChunk;

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub temperature: Option<f64>,
    /// Combined-context cap in characters; chunks past it are left out.
    pub max_context_chars: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            temperature: Some(0.1),
            max_context_chars: 24_000,
        }
    }
}

/// All analysis sections for one document.
#[derive(Debug, Clone)]
pub struct ComprehensiveReport {
    pub executive_summary: String,
    pub outcomes_analysis: String,
    pub feedback_analysis: String,
    pub recommendations: String,
}

impl ComprehensiveReport {
    pub fn to_markdown(&self, source_id: &str) -> String {
        format!(
            "# Report Analysis: {}\n\n\
             ## Executive Summary\n{}\n\n\
             ## Key Outcomes Analysis\n{}\n\n\
             ## Attendee Feedback Analysis\n{}\n\n\
             ## Strategic Recommendations\n{}\n\n\
             ---\n*Generated {}*\n",
            source_id,
            self.executive_summary,
            self.outcomes_analysis,
            self.feedback_analysis,
            self.recommendations,
            chrono::Utc::now().to_rfc3339(),
        )
    }
}

pub struct Summarizer {
    provider: Arc<dyn LlmProvider>,
    config: SummarizerConfig,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn LlmProvider>, config: SummarizerConfig) -> Self {
        Self { provider, config }
    }

    pub async fn executive_summary(&self, chunks: &[DocumentChunk]) -> String {
        self.analyze(
            chunks,
            "provide a comprehensive executive summary. Focus on key outcomes, \
             achievements, and strategic insights",
            "1. Event Overview\n2. Key Achievements\n3. Strategic Outcomes\n4. Notable Highlights",
        )
        .await
    }

    pub async fn analyze_outcomes(&self, chunks: &[DocumentChunk]) -> String {
        self.analyze(
            chunks,
            "identify key outcomes and results",
            "1. Primary Outcomes\n2. Measurable Results\n3. Impact Assessment\n4. Success Metrics",
        )
        .await
    }

    pub async fn analyze_feedback(&self, chunks: &[DocumentChunk]) -> String {
        self.analyze(
            chunks,
            "extract attendee feedback and satisfaction metrics",
            "1. Attendee Satisfaction\n2. Feedback Themes\n3. Areas for Improvement\n\
             4. Positive Feedback Highlights",
        )
        .await
    }

    pub async fn recommendations(&self, chunks: &[DocumentChunk]) -> String {
        self.analyze(
            chunks,
            "provide strategic recommendations for future events",
            "1. Event Improvements\n2. Strategic Enhancements\n3. Best Practices to Continue\n\
             4. Innovation Opportunities",
        )
        .await
    }

    /// Run the full analysis suite. Sections run sequentially; a failed
    /// section carries its error text without affecting the others.
    pub async fn comprehensive_report(&self, chunks: &[DocumentChunk]) -> ComprehensiveReport {
        ComprehensiveReport {
            executive_summary: self.executive_summary(chunks).await,
            outcomes_analysis: self.analyze_outcomes(chunks).await,
            feedback_analysis: self.analyze_feedback(chunks).await,
            recommendations: self.recommendations(chunks).await,
        }
    }

    async fn analyze(&self, chunks: &[DocumentChunk], task: &str, outline: &str) -> String {
        if chunks.is_empty() {
            return "No document content available to analyze.".to_string();
        }

        let content = self.combine_chunks(chunks);
        let prompt = format!(
            "Analyze the following report content and {}.\n\n\
             Report Content:\n{}\n\n\
             Please provide a detailed analysis covering:\n{}\n\nAnalysis:",
            task, content, outline
        );

        let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(self.config.temperature);

        match self.provider.chat(request).await {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                tracing::warn!(error = %err, "summary model call failed");
                format!("Error generating analysis: {}", err)
            }
        }
    }

    fn combine_chunks(&self, chunks: &[DocumentChunk]) -> String {
        let mut combined = String::new();
        for chunk in chunks {
            if combined.chars().count() + chunk.text.chars().count() > self.config.max_context_chars
            {
                break;
            }
            if !combined.is_empty() {
                combined.push_str("\n\n");
            }
            combined.push_str(&chunk.text);
        }
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::PipelineError;
    use async_trait::async_trait;

    struct EchoProvider {
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn health_check(&self) -> Result<bool, PipelineError> {
            Ok(true)
        }

        async fn chat(&self, request: ChatRequest) -> Result<String, PipelineError> {
            if self.fail {
                return Err(PipelineError::Provider("quota exceeded".to_string()));
            }
            Ok(format!("summary of {} chars", request.messages[0].content.len()))
        }

        async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
            Ok(Vec::new())
        }
    }

    fn chunk(text: &str) -> DocumentChunk {
        DocumentChunk {
            text: text.to_string(),
            section_title: "Body".to_string(),
            source_id: "report".to_string(),
            sequence_index: 0,
        }
    }

    #[tokio::test]
    async fn empty_chunks_short_circuit() {
        let summarizer = Summarizer::new(
            Arc::new(EchoProvider { fail: false }),
            SummarizerConfig::default(),
        );
        let result = summarizer.executive_summary(&[]).await;
        assert_eq!(result, "No document content available to analyze.");
    }

    #[tokio::test]
    async fn model_failure_degrades_to_error_text() {
        let summarizer = Summarizer::new(
            Arc::new(EchoProvider { fail: true }),
            SummarizerConfig::default(),
        );
        let result = summarizer.analyze_outcomes(&[chunk("the event went well")]).await;
        assert!(result.starts_with("Error generating analysis:"));
    }

    #[tokio::test]
    async fn context_is_capped() {
        let summarizer = Summarizer::new(
            Arc::new(EchoProvider { fail: false }),
            SummarizerConfig {
                max_context_chars: 30,
                ..SummarizerConfig::default()
            },
        );
        let chunks = vec![chunk(&"a".repeat(25)), chunk(&"b".repeat(25))];
        let combined = summarizer.combine_chunks(&chunks);
        assert_eq!(combined, "a".repeat(25));
    }

    #[test]
    fn report_renders_all_sections() {
        let report = ComprehensiveReport {
            executive_summary: "S".to_string(),
            outcomes_analysis: "O".to_string(),
            feedback_analysis: "F".to_string(),
            recommendations: "R".to_string(),
        };
        let markdown = report.to_markdown("annual-report");
        assert!(markdown.contains("# Report Analysis: annual-report"));
        assert!(markdown.contains("## Executive Summary\nS"));
        assert!(markdown.contains("## Strategic Recommendations\nR"));
    }
}
