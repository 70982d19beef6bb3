//! Chunk indexing.
//!
//! Embeds chunks through the provider and hands them to the vector store.
//! Partial success is acceptable: a chunk whose embedding fails is logged
//! and skipped, never retried, and does not abort the batch.

use std::sync::Arc;

use crate::core::errors::PipelineError;
use crate::llm::LlmProvider;
use crate::segment::DocumentChunk;
use crate::store::VectorStore;

/// Outcome of one indexing batch.
#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    pub indexed: usize,
    pub skipped: usize,
}

pub struct Indexer {
    provider: Arc<dyn LlmProvider>,
    store: Arc<dyn VectorStore>,
}

impl Indexer {
    pub fn new(provider: Arc<dyn LlmProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { provider, store }
    }

    /// Embed and store a batch of chunks.
    ///
    /// Tries one batched embedding call first; when that fails, falls back
    /// to per-chunk embedding so a single bad chunk cannot sink the batch.
    /// Fails with `IndexingError` only when no chunk could be stored.
    pub async fn index(&self, chunks: &[DocumentChunk]) -> Result<IndexReport, PipelineError> {
        if chunks.is_empty() {
            return Ok(IndexReport::default());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

        let mut items: Vec<(DocumentChunk, Vec<f32>)> = Vec::with_capacity(chunks.len());
        let mut skipped = 0usize;

        match self.provider.embed(&texts).await {
            Ok(embeddings) => {
                for (chunk, embedding) in chunks.iter().zip(embeddings) {
                    items.push((chunk.clone(), embedding));
                }
            }
            Err(batch_err) => {
                tracing::warn!(
                    error = %batch_err,
                    "batch embedding failed, retrying chunks individually"
                );
                for chunk in chunks {
                    match self.provider.embed(&[chunk.text.clone()]).await {
                        Ok(mut embeddings) if !embeddings.is_empty() => {
                            items.push((chunk.clone(), embeddings.remove(0)));
                        }
                        Ok(_) => {
                            skipped += 1;
                            tracing::warn!(
                                section = %chunk.section_title,
                                index = chunk.sequence_index,
                                "no embedding returned, skipping chunk"
                            );
                        }
                        Err(err) => {
                            skipped += 1;
                            tracing::warn!(
                                section = %chunk.section_title,
                                index = chunk.sequence_index,
                                error = %err,
                                "embedding failed, skipping chunk"
                            );
                        }
                    }
                }
            }
        }

        if items.is_empty() {
            return Err(PipelineError::Indexing(format!(
                "all {} chunks failed to embed",
                chunks.len()
            )));
        }

        let indexed = items.len();
        self.store
            .insert_batch(items)
            .await
            .map_err(|e| PipelineError::Indexing(e.to_string()))?;

        tracing::info!(indexed, skipped, "indexed chunk batch");
        Ok(IndexReport { indexed, skipped })
    }
}
