//! Query-time retrieval.
//!
//! Embeds the query and asks the store for the top-k most similar chunks.
//! An empty result is a valid answer; only an unreachable provider or store
//! surfaces as `RetrievalError`.

use std::sync::Arc;

use crate::core::config::RetrievalConfig;
use crate::core::errors::PipelineError;
use crate::llm::LlmProvider;
use crate::store::{ScoredChunk, VectorStore};

/// Ordered retrieval matches for one query, descending by score.
pub type RetrievalResult = Vec<ScoredChunk>;

pub struct Retriever {
    provider: Arc<dyn LlmProvider>,
    store: Arc<dyn VectorStore>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        store: Arc<dyn VectorStore>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            provider,
            store,
            config,
        }
    }

    pub fn top_k(&self) -> usize {
        self.config.top_k
    }

    /// Retrieve up to `k` chunks relevant to `query`.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult, PipelineError> {
        let embeddings = self
            .provider
            .embed(&[query.to_string()])
            .await
            .map_err(|e| PipelineError::Retrieval(e.to_string()))?;

        let query_embedding = embeddings
            .first()
            .ok_or_else(|| PipelineError::Retrieval("no query embedding returned".to_string()))?;

        let results = self
            .store
            .search(query_embedding, k)
            .await
            .map_err(|e| PipelineError::Retrieval(e.to_string()))?;

        tracing::debug!(query, matches = results.len(), "retrieval complete");
        Ok(results)
    }

    /// Retrieve with the configured default k.
    pub async fn retrieve_default(&self, query: &str) -> Result<RetrievalResult, PipelineError> {
        self.retrieve(query, self.config.top_k).await
    }
}
