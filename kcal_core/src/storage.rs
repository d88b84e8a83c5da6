//! Durable storage for the workout history.
//!
//! The history lives in a single named slot holding the whole serialized
//! collection. Writers replace the slot wholesale; there is no incremental
//! persistence.
//!
//! Across processes, a read-modify-write cycle on a [`JsonFileStorage`] is
//! serialized by holding [`JsonFileStorage::lock`] (an exclusive lock on a
//! `<slot>.lock` sidecar file) from the load until the write has landed.

use crate::{Error, Result};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// A single slot holding the serialized history
pub trait HistoryStorage: Send {
    /// Read the slot; `Ok(None)` when nothing has been stored yet
    fn read(&self) -> Result<Option<String>>;

    /// Replace the slot's contents
    fn write(&mut self, contents: &str) -> Result<()>;
}

// ============================================================================
// File-backed slot
// ============================================================================

/// JSON file slot with file locking and atomic replacement
#[derive(Clone, Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
}

/// Exclusive writer lock on a file slot; released on drop
#[derive(Debug)]
pub struct SlotLock {
    file: File,
}

impl Drop for SlotLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sidecar file the writer lock is taken on (`workouts.json.lock`)
    ///
    /// The slot itself is replaced by rename on every write, so it cannot
    /// carry a lock that outlives one write.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Block until this process is the only writer of the slot
    ///
    /// Hold the guard across load and write so another process cannot
    /// interleave its own read-modify-write and drop an update.
    pub fn lock(&self) -> Result<SlotLock> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        file.lock_exclusive()?;

        tracing::debug!("Acquired writer lock {:?}", lock_path);
        Ok(SlotLock { file })
    }
}

impl HistoryStorage for JsonFileStorage {
    /// Read the slot under a shared lock
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        let _ = file.unlock();
        read.map_err(|e| Error::StorageRead(format!("{:?}: {}", self.path, e)))?;

        tracing::debug!("Read {} bytes from {:?}", contents.len(), self.path);
        Ok(Some(contents))
    }

    /// Atomically replace the slot
    ///
    /// 1. Write to a temp file in the same directory
    /// 2. Sync to disk
    /// 3. Rename over the original, so readers never see a partial write
    fn write(&mut self, contents: &str) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let temp = NamedTempFile::new_in(&parent)?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Wrote {} bytes to {:?}", contents.len(), self.path);
        Ok(())
    }
}

// ============================================================================
// In-memory slot
// ============================================================================

/// In-memory slot; clones share the same contents
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with `contents` (which need not be valid)
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(contents.into()))),
        }
    }

    /// Current contents of the slot
    pub fn contents(&self) -> Option<String> {
        self.slot.lock().clone()
    }
}

impl HistoryStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.slot.lock().clone())
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        *self.slot.lock() = Some(contents.to_string());
        Ok(())
    }
}
