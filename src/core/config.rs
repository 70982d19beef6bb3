//! Application configuration.
//!
//! Settings load from an optional TOML file, then environment variables
//! override the provider endpoint fields. The provider API key is never read
//! from the file; it comes only from the environment. A named key variable
//! that is missing is the one error allowed to halt startup.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::PipelineError;

/// Connection settings for the OpenAI-compatible model endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the endpoint, e.g. `http://localhost:1234`.
    pub base_url: String,
    /// Model id used for chat completions.
    pub chat_model: String,
    /// Model id used for embeddings.
    pub embedding_model: String,
    /// Name of the environment variable holding the API key, if the
    /// endpoint requires one. Empty means no key is sent.
    pub api_key_env: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub temperature: Option<f64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234".to_string(),
            chat_model: "default".to_string(),
            embedding_model: "default".to_string(),
            api_key_env: String::new(),
            timeout_secs: 60,
            temperature: Some(0.3),
        }
    }
}

/// Tunables for the segmenter.
///
/// The paragraph and bracket thresholds are deliberately plain configuration
/// values carried over from the source material they were tuned on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Maximum characters per emitted chunk.
    pub max_chunk_chars: usize,
    /// Chunks below this size are dropped when a chunk is closed.
    pub min_chunk_chars: usize,
    /// Paragraphs below this size are treated as noise.
    pub min_paragraph_chars: usize,
    /// Sections whose body is below this size are dropped whole.
    pub min_section_chars: usize,
    /// Paragraphs with more opening brackets than this look like link lists.
    pub max_paragraph_brackets: usize,
    /// Literal header lines that open a new section.
    pub section_markers: Vec<String>,
    /// Sections whose title contains one of these (case-insensitive) are
    /// skipped entirely.
    pub excluded_sections: Vec<String>,
    /// Title used for text before the first recognized header.
    pub default_section_title: String,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 1500,
            min_chunk_chars: 200,
            min_paragraph_chars: 50,
            min_section_chars: 100,
            max_paragraph_brackets: 3,
            section_markers: Vec::new(),
            excluded_sections: vec![
                "references".to_string(),
                "external links".to_string(),
                "further reading".to_string(),
                "notes".to_string(),
                "see also".to_string(),
            ],
            default_section_title: "Untitled".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks requested per query.
    pub top_k: usize,
    /// Matches scoring below this are dropped by the store.
    pub similarity_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            similarity_threshold: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum dispatch/execute round-trips per turn.
    pub max_steps: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { max_steps: 6 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub segmenter: SegmenterConfig,
    pub retrieval: RetrievalConfig,
    pub orchestrator: OrchestratorConfig,
    /// Directory for rolling log files. Empty means stdout only.
    pub log_dir: String,
}

impl AppConfig {
    /// Load configuration from an optional TOML file, then apply environment
    /// overrides and resolve the API key.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let mut config = match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|e| {
                    PipelineError::Configuration(format!(
                        "failed to read config {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                toml::from_str::<AppConfig>(&raw).map_err(|e| {
                    PipelineError::Configuration(format!(
                        "failed to parse config {}: {}",
                        path.display(),
                        e
                    ))
                })?
            }
            None => AppConfig::default(),
        };

        if let Ok(url) = env::var("DOCQA_BASE_URL") {
            config.provider.base_url = url;
        }
        if let Ok(model) = env::var("DOCQA_CHAT_MODEL") {
            config.provider.chat_model = model;
        }
        if let Ok(model) = env::var("DOCQA_EMBEDDING_MODEL") {
            config.provider.embedding_model = model;
        }

        Ok(config)
    }

    /// Resolve the API key from the configured environment variable.
    ///
    /// Returns `Ok(None)` when no key variable is configured. A configured
    /// variable that is missing from the environment is fatal.
    pub fn api_key(&self) -> Result<Option<String>, PipelineError> {
        if self.provider.api_key_env.is_empty() {
            return Ok(None);
        }
        match env::var(&self.provider.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(Some(key)),
            _ => Err(PipelineError::Configuration(format!(
                "API key environment variable `{}` is not set",
                self.provider.api_key_env
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.segmenter.max_chunk_chars, 1500);
        assert!(config.segmenter.min_chunk_chars < config.segmenter.max_chunk_chars);
        assert_eq!(config.retrieval.top_k, 5);
        assert!(config.orchestrator.max_steps > 0);
    }

    #[test]
    fn toml_round_trip() {
        let config = AppConfig::default();
        let raw = toml::to_string(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&raw).expect("parse");
        assert_eq!(parsed.provider.base_url, config.provider.base_url);
        assert_eq!(
            parsed.segmenter.excluded_sections,
            config.segmenter.excluded_sections
        );
    }

    #[test]
    fn missing_key_variable_is_fatal() {
        let mut config = AppConfig::default();
        config.provider.api_key_env = "DOCQA_TEST_KEY_THAT_DOES_NOT_EXIST".to_string();
        let err = config.api_key().unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn empty_key_variable_means_no_key() {
        let config = AppConfig::default();
        assert!(config.api_key().expect("no key required").is_none());
    }
}
