//! Snapshot Module
//!
//! Durable JSON snapshot of the cache root.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{CacheError, Result};

/// Outcome of reading a snapshot from disk.
#[derive(Debug)]
pub enum SnapshotRead {
    /// No snapshot exists yet
    Missing,
    /// The snapshot parsed into a mapping
    Loaded(Map<String, Value>),
    /// The file exists but could not be read or parsed
    Corrupt(String),
}

// == Snapshot ==
/// Location of the cache snapshot and whether writes are suppressed.
#[derive(Debug, Clone)]
pub struct Snapshot {
    path: PathBuf,
    dry_run: bool,
}

impl Snapshot {
    pub fn new(path: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            path: path.into(),
            dry_run,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Reads the snapshot.
    pub fn read(&self) -> SnapshotRead {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return SnapshotRead::Missing,
            Err(err) => return SnapshotRead::Corrupt(err.to_string()),
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(root)) => SnapshotRead::Loaded(root),
            Ok(other) => SnapshotRead::Corrupt(format!(
                "expected a mapping at the top level, found {}",
                crate::cache::tree::kind_name(&other)
            )),
            Err(err) => SnapshotRead::Corrupt(err.to_string()),
        }
    }

    /// Writes `root` to a temporary file next to the snapshot, then renames
    /// it into place. Does nothing in dry-run mode.
    pub fn write(&self, root: &Map<String, Value>) -> Result<()> {
        if self.dry_run {
            info!("Dry run, not saving cache.");
            return Ok(());
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.persistence_error(e))?;

        let tmp = NamedTempFile::new_in(&dir).map_err(|e| self.persistence_error(e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(&mut writer, root).map_err(|e| self.persistence_error(e))?;
            writer.flush().map_err(|e| self.persistence_error(e))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| self.persistence_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.persistence_error(e.error))?;

        debug!("Cache saved to {}", self.path.display());
        Ok(())
    }

    fn persistence_error(&self, err: impl std::fmt::Display) -> CacheError {
        CacheError::Persistence {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }
}
