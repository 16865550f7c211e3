pub mod engine;

pub use engine::{RetrievalEngine, ScoredChunk};
