//! Error types for ELERAG
//!
//! Recoverable kinds (malformed rows, knowledge-base outages) are logged and
//! skipped by the pipeline; everything else aborts the current command.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for ingest and query operations
#[derive(Error, Debug)]
pub enum RagError {
    /// Query attempted before any memory file was written
    #[error("No memory found at {}; run `elerag ingest <file>` first", path.display())]
    MissingMemory { path: PathBuf },

    /// Memory file exists but does not satisfy the record invariants
    #[error("Memory file is corrupt: {0}")]
    CorruptMemory(String),

    /// Unreadable source row or truncated source file
    #[error("Malformed source: {0}")]
    MalformedSource(String),

    /// Knowledge-base lookup failed (network, status, or payload)
    #[error("Knowledge base unavailable: {0}")]
    KbUnavailable(String),

    /// Embedding model failed to load or to produce vectors
    #[error("Embedder failure: {0}")]
    EmbedderFailure(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    BadConfig(String),

    /// External generator returned no usable answer
    #[error("Generator returned no usable answer")]
    ExternalToolFailure { raw: String },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV reader errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for ELERAG operations
pub type Result<T> = std::result::Result<T, RagError>;

impl RagError {
    /// Process exit code the binary reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            RagError::MissingMemory { .. } => 2,
            RagError::ExternalToolFailure { .. } => 3,
            RagError::BadConfig(_) => 4,
            _ => 1,
        }
    }
}

/// Convert anyhow errors to RagError
impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        RagError::Generic(format!("{:#}", err))
    }
}
