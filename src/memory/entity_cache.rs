// Persistent surface-string -> knowledge-base id cache
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::memory::store::write_atomic;

/// Outcome of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Previously resolved to this id
    Hit(String),
    /// Previously looked up with no match (only with negative caching)
    KnownMiss,
    /// Never looked up
    Miss,
}

/// Append-only mapping from entity surface text to a resolved id.
///
/// `None` values record a lookup that found no candidates.
#[derive(Debug, Clone, Default)]
pub struct EntityCache {
    entries: BTreeMap<String, Option<String>>,
    path: Option<PathBuf>,
    dirty: bool,
}

impl EntityCache {
    /// Empty in-memory cache with no backing file
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`; missing or unreadable files yield an empty cache
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<BTreeMap<String, Option<String>>>(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "entity cache unreadable, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "entity cache unreadable, starting empty");
                BTreeMap::new()
            }
        };

        debug!(path = %path.display(), entries = entries.len(), "entity cache loaded");
        Self {
            entries,
            path: Some(path),
            dirty: false,
        }
    }

    pub fn lookup(&self, surface: &str) -> CacheLookup {
        match self.entries.get(surface) {
            Some(Some(id)) => CacheLookup::Hit(id.clone()),
            Some(None) => CacheLookup::KnownMiss,
            None => CacheLookup::Miss,
        }
    }

    /// Record a resolution; `None` records a lookup without candidates
    pub fn store(&mut self, surface: &str, id: Option<String>) {
        self.entries.insert(surface.to_string(), id);
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the cache to its backing file.
    ///
    /// No-op for in-memory caches and for caches with no entries added since
    /// load or the last save.
    pub fn save(&mut self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        if !self.dirty {
            debug!(path = %path.display(), "entity cache unchanged, not saved");
            return Ok(());
        }

        let json = serde_json::to_vec(&self.entries)?;
        write_atomic(path, &json)?;
        self.dirty = false;

        debug!(path = %path.display(), entries = self.entries.len(), "entity cache saved");
        Ok(())
    }
}
