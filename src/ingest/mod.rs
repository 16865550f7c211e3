//! Corpus ingestion
//!
//! Components:
//! - Loader: CSV rows and text files -> deduplicated chunk strings
//! - Chunker: sentence-aligned overlapping chunks for prose
//! - Email: header stripping and date tagging for exported mailboxes
//! - Orchestrator: embeds, links entities, and writes the memory file

pub mod chunker;
pub mod email;
pub mod loader;
pub mod orchestrator;

pub use chunker::SmartChunker;
pub use email::EmailNormalizer;
pub use loader::{LoadStats, LoadedSource, Row, SourceLoader, SourceMode};
pub use orchestrator::{IngestReport, Ingestor};
