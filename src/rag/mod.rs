//! Query-time retrieval
//!
//! Components:
//! - Expansion: keyword variant and mean query vector
//! - Retrieval Engine: dense + entity ranks fused with RRF, diversity filter
//! - Pipeline: memory loading and the end-to-end query path

pub mod expansion;
pub mod pipeline;
pub mod retrieval;

pub use expansion::QueryExpander;
pub use pipeline::{Passage, RagPipeline};
pub use retrieval::{RetrievalEngine, ScoredChunk};
