//! Core data types for the memory file

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Dense chunk identifier; equals the record's position in memory
pub type ChunkId = usize;

/// Tag attached to a chunk: a knowledge-base id or a lowercased surface string.
///
/// Serialized as a two-element array (`["wiki", "Q312"]`, `["text", "2001"]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "(String, String)", try_from = "(String, String)")]
pub enum Entity {
    Wiki(String),
    Text(String),
}

/// Set of entity tags; ordered so serialized memory is byte-stable
pub type EntitySet = BTreeSet<Entity>;

impl Entity {
    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Wiki(_) => "wiki",
            Entity::Text(_) => "text",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Entity::Wiki(value) | Entity::Text(value) => value,
        }
    }

    /// Surface-string tag; the value is lowercased on construction
    pub fn text(surface: &str) -> Self {
        Entity::Text(surface.to_lowercase())
    }
}

impl From<Entity> for (String, String) {
    fn from(entity: Entity) -> Self {
        let kind = entity.kind().to_string();
        match entity {
            Entity::Wiki(value) | Entity::Text(value) => (kind, value),
        }
    }
}

impl TryFrom<(String, String)> for Entity {
    type Error = String;

    fn try_from((kind, value): (String, String)) -> Result<Self, Self::Error> {
        match kind.as_str() {
            "wiki" => Ok(Entity::Wiki(value)),
            "text" => Ok(Entity::Text(value)),
            other => Err(format!("unknown entity kind '{}'", other)),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.value())
    }
}

/// Unit of indexing: one chunk, its embedding and its entity tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: ChunkId,
    pub text: String,
    pub vector: Vec<f32>,
    pub entities: EntitySet,
}

impl ChunkRecord {
    pub fn new(id: ChunkId, text: String, vector: Vec<f32>, entities: EntitySet) -> Self {
        Self {
            id,
            text,
            vector,
            entities,
        }
    }

    /// Number of tags shared with `other`
    pub fn entity_overlap(&self, other: &EntitySet) -> usize {
        self.entities.intersection(other).count()
    }
}
