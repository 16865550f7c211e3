// Memory file persistence: whole-file snapshots of chunk records
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::{RagError, Result};
use crate::memory::types::ChunkRecord;

/// Handle to one memory file on disk
#[derive(Debug, Clone)]
pub struct MemoryStore {
    path: PathBuf,
}

impl MemoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Replace the memory file with `records`.
    ///
    /// Records must be numbered `0..n` in order. The file is written to a
    /// sibling temp path and renamed, so readers never see a partial file.
    pub fn save(&self, records: &[ChunkRecord]) -> Result<()> {
        validate_records(records)?;

        let json = serde_json::to_vec(records)?;
        write_atomic(&self.path, &json)?;

        info!(path = %self.path.display(), records = records.len(), "memory saved");
        Ok(())
    }

    /// Load every record; `MissingMemory` when nothing has been ingested yet
    pub fn load(&self) -> Result<Vec<ChunkRecord>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RagError::MissingMemory {
                    path: self.path.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let records: Vec<ChunkRecord> = serde_json::from_slice(&bytes)
            .map_err(|e| RagError::CorruptMemory(format!("{}: {}", self.path.display(), e)))?;
        validate_records(&records)?;

        debug!(path = %self.path.display(), records = records.len(), "memory loaded");
        Ok(records)
    }
}

/// Check `id == position` and a single shared vector dimension
fn validate_records(records: &[ChunkRecord]) -> Result<()> {
    let dimension = records.first().map(|r| r.vector.len());
    for (index, record) in records.iter().enumerate() {
        if record.id != index {
            return Err(RagError::CorruptMemory(format!(
                "record at position {} has id {}",
                index, record.id
            )));
        }
        if Some(record.vector.len()) != dimension {
            return Err(RagError::CorruptMemory(format!(
                "record {} has dimension {}, expected {}",
                record.id,
                record.vector.len(),
                dimension.unwrap_or(0)
            )));
        }
    }
    Ok(())
}

/// Write `bytes` to `<path>.tmp`, fsync, then rename over `path`
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}
