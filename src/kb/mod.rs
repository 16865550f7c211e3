//! Knowledge-base search
//!
//! `KnowledgeBase` is the lookup seam used by the entity resolver;
//! `WikidataClient` is the default HTTP binding.

pub mod wikidata;

pub use wikidata::WikidataClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// One search hit: an opaque id plus the text used for disambiguation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbCandidate {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl KbCandidate {
    pub fn new(id: impl Into<String>, label: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: description.map(str::to_string),
        }
    }

    /// Text embedded when choosing between candidates: description, else label
    pub fn gloss(&self) -> &str {
        match self.description.as_deref() {
            Some(description) if !description.trim().is_empty() => description,
            _ => &self.label,
        }
    }
}

/// Entity search over an external knowledge base
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Up to `limit` candidates for `surface`, best match first.
    ///
    /// Every failure mode surfaces as `RagError::KbUnavailable`.
    async fn search(&self, surface: &str, limit: usize) -> Result<Vec<KbCandidate>>;
}
