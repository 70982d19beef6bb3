//! Study-question generation.
//!
//! Asks the model for a handful of investigative questions about a topic and
//! parses them out of numbered lines. A failed model call falls back to a
//! fixed question template so callers always get something to work with.

use std::sync::Arc;

use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

const MAX_QUESTIONS: usize = 6;
const MIN_QUESTION_CHARS: usize = 10;

pub struct QuestionGenerator {
    provider: Arc<dyn LlmProvider>,
}

impl QuestionGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Generate up to six questions about `topic`.
    pub async fn generate(&self, topic: &str) -> Vec<String> {
        let system = "You are an expert educator. Generate 5-6 relevant, investigative \
                      questions about the given topic covering its definition, key features, \
                      historical significance, current research, scientific importance, and \
                      interesting facts. Return only the numbered questions, one per line, \
                      without any additional text.";
        let request = ChatRequest::new(vec![
            ChatMessage::system(system),
            ChatMessage::user(format!("Generate 5-6 relevant questions about: {}", topic)),
        ]);

        match self.provider.chat(request).await {
            Ok(response) => {
                let questions = parse_questions(&response);
                if questions.is_empty() {
                    fallback_questions(topic)
                } else {
                    questions
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, topic, "question generation failed, using fallback");
                fallback_questions(topic)
            }
        }
    }
}

/// Pull questions out of numbered or bulleted lines.
fn parse_questions(response: &str) -> Vec<String> {
    let mut questions = Vec::new();

    for line in response.lines() {
        let line = line.trim();
        let numbered = line.starts_with(|c: char| c.is_ascii_digit());
        let bulleted = line.starts_with('-') || line.starts_with('*');
        if line.is_empty() || !(numbered || bulleted) {
            continue;
        }

        let question = line
            .split_once(". ")
            .or_else(|| line.split_once(") "))
            .or_else(|| line.split_once(' '))
            .map(|(_, rest)| rest)
            .unwrap_or(line)
            .trim();

        if question.chars().count() >= MIN_QUESTION_CHARS {
            questions.push(question.to_string());
        }
        if questions.len() == MAX_QUESTIONS {
            break;
        }
    }

    questions
}

fn fallback_questions(topic: &str) -> Vec<String> {
    vec![
        format!("What is {} and how is it defined?", topic),
        format!("What are the key features and characteristics of {}?", topic),
        format!("How was {} discovered and what is its historical significance?", topic),
        format!("What recent research has been done on {}?", topic),
        format!("Why is {} important to its field?", topic),
        format!("What are some interesting or surprising facts about {}?", topic),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbered_lines() {
        let response = "1. What is a pulsar made of?\n2) How fast do pulsars spin?\n\
                        Some commentary the model added.\n- Why do pulsars emit beams?";
        let questions = parse_questions(response);
        assert_eq!(
            questions,
            vec![
                "What is a pulsar made of?",
                "How fast do pulsars spin?",
                "Why do pulsars emit beams?",
            ]
        );
    }

    #[test]
    fn short_fragments_are_dropped() {
        let questions = parse_questions("1. Why?\n2. What is the expansion of the universe?");
        assert_eq!(questions, vec!["What is the expansion of the universe?"]);
    }

    #[test]
    fn caps_at_six_questions() {
        let response = (1..=9)
            .map(|i| format!("{i}. Question number {i} about the chosen topic?"))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(parse_questions(&response).len(), 6);
    }

    #[test]
    fn fallback_mentions_topic() {
        let questions = fallback_questions("black holes");
        assert_eq!(questions.len(), 6);
        assert!(questions.iter().all(|q| q.contains("black holes")));
    }
}
