//! Vector store abstraction.
//!
//! The embedding/similarity engine is an external capability: chunks with
//! embeddings go in, ranked chunks come out. Nothing in the pipeline depends
//! on the index data structure or distance metric behind this trait.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::PipelineError;
use crate::segment::DocumentChunk;

pub use memory::MemoryVectorStore;

/// One retrieval match: a chunk and its relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    /// Similarity score, higher is better.
    pub score: f32,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert chunks with their embedding vectors.
    async fn insert_batch(
        &self,
        items: Vec<(DocumentChunk, Vec<f32>)>,
    ) -> Result<(), PipelineError>;

    /// Return up to `k` chunks most similar to the query embedding, ordered
    /// by descending score. An empty result is a valid answer, not an error.
    async fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, PipelineError>;

    /// Number of stored chunks.
    async fn count(&self) -> Result<usize, PipelineError>;

    /// Drop all stored chunks.
    async fn clear(&self) -> Result<(), PipelineError>;
}
