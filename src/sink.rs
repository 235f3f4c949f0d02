use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use tracing::debug;

use crate::error::{MtbError, Result};

/// Destination for canonical records. Destinations are relative paths such as
/// `2024/01_mairipora/event.json`.
pub trait Sink {
    /// Whether a record is already stored at `destination`.
    fn exists(&self, destination: &Path) -> bool;

    fn store<T: Serialize>(&self, record: &T, destination: &Path) -> Result<()>;
}

/// Writes each record as pretty-printed JSON under a root directory.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    root: PathBuf,
}

impl JsonFileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Sink for JsonFileSink {
    fn exists(&self, destination: &Path) -> bool {
        self.root.join(destination).exists()
    }

    fn store<T: Serialize>(&self, record: &T, destination: &Path) -> Result<()> {
        let path = self.root.join(destination);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| MtbError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let file = fs::File::create(&path).map_err(|e| MtbError::Io {
            path: path.clone(),
            source: e,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, record)?;
        writer.flush().map_err(|e| MtbError::Io {
            path: path.clone(),
            source: e,
        })?;
        debug!(path = %path.display(), "stored record");
        Ok(())
    }
}

/// Keeps records as JSON values in memory, keyed by destination.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<BTreeMap<PathBuf, serde_json::Value>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, destination: impl AsRef<Path>) -> Option<serde_json::Value> {
        self.lock().get(destination.as_ref()).cloned()
    }

    pub fn destinations(&self) -> Vec<PathBuf> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<PathBuf, serde_json::Value>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Sink for MemorySink {
    fn exists(&self, destination: &Path) -> bool {
        self.lock().contains_key(destination)
    }

    fn store<T: Serialize>(&self, record: &T, destination: &Path) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.lock().insert(destination.to_path_buf(), value);
        Ok(())
    }
}
