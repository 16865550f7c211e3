//! Persistent memory: chunk records, their embeddings, and the entity cache
//!
//! Components:
//! - Types: chunk records and `(kind, value)` entity tags
//! - Store: whole-file JSON snapshot, written atomically at ingest end
//! - Entity Cache: surface text -> knowledge-base id, reloaded every run
//! - Embedding: the `Embedder` seam, the local Candle engine, vector math

pub mod embedding;
pub mod entity_cache;
pub mod store;
pub mod types;

pub use embedding::{Embedder, EmbeddingEngine};
pub use entity_cache::{CacheLookup, EntityCache};
pub use store::MemoryStore;
pub use types::{ChunkId, ChunkRecord, Entity, EntitySet};
