//! Grounded document Q&A pipeline.
//!
//! Raw text flows through the [`segment::Segmenter`] into bounded chunks,
//! the [`index::Indexer`] embeds and stores them, the
//! [`retrieve::Retriever`] pulls top-k matches per query, and the
//! [`compose::AnswerComposer`] turns matches into a cited answer. The
//! [`agent::Orchestrator`] wraps retrieval and analysis as tools inside a
//! bounded model-driven dispatch loop. The language model and the vector
//! store are capability traits; everything else is plain sequential logic.

pub mod agent;
pub mod compose;
pub mod core;
pub mod index;
pub mod llm;
pub mod loader;
pub mod questions;
pub mod retrieve;
pub mod segment;
pub mod session;
pub mod store;
pub mod summarize;

pub use agent::{Orchestrator, ToolRegistry};
pub use compose::{AnswerComposer, GroundedAnswer};
pub use core::config::AppConfig;
pub use core::errors::PipelineError;
pub use index::Indexer;
pub use retrieve::Retriever;
pub use segment::{DocumentChunk, Segmenter};
pub use session::Conversation;
pub use store::{MemoryVectorStore, ScoredChunk, VectorStore};
