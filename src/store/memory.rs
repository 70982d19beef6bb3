//! In-memory vector store.
//!
//! Brute-force cosine similarity over a process-local chunk list. Writes
//! happen once during indexing, before any retrieval, so a single RwLock is
//! enough; there is no concurrent index-mutation-during-query scenario.

use std::cmp::Ordering;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ScoredChunk, VectorStore};
use crate::core::errors::PipelineError;
use crate::segment::DocumentChunk;

pub struct MemoryVectorStore {
    entries: RwLock<Vec<(DocumentChunk, Vec<f32>)>>,
    /// Matches scoring below this are dropped from search results.
    similarity_threshold: f32,
}

impl MemoryVectorStore {
    pub fn new(similarity_threshold: f32) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            similarity_threshold,
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn insert_batch(
        &self,
        items: Vec<(DocumentChunk, Vec<f32>)>,
    ) -> Result<(), PipelineError> {
        let mut entries = self.entries.write().await;
        entries.extend(items);
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, PipelineError> {
        let entries = self.entries.read().await;

        let mut scored: Vec<ScoredChunk> = entries
            .iter()
            .map(|(chunk, embedding)| ScoredChunk {
                chunk: chunk.clone(),
                score: cosine_similarity(query_embedding, embedding),
            })
            .filter(|scored| scored.score > self.similarity_threshold)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize, PipelineError> {
        Ok(self.entries.read().await.len())
    }

    async fn clear(&self) -> Result<(), PipelineError> {
        self.entries.write().await.clear();
        Ok(())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}
