//! Storage providers
//!
//! The persistence collaborator behind the cache. The engine depends only on
//! this being a keyed read/write store attributed to a user, not on any
//! particular implementation. `MemoryStorageProvider` backs tests and guest
//! sessions; `FileStorageProvider` gives local sessions durability across
//! restarts with one JSON document per record.

use folio_core::{Error, Pointer, Record, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keyed, user-attributed record persistence
///
/// Implementations must treat `(user_id, pointer)` as the full key: two users
/// never observe each other's records through a provider.
pub trait StorageProvider: Send + Sync {
    /// Load the persisted record for a user and pointer, if any
    fn load(&self, user_id: &str, pointer: &Pointer) -> Result<Option<Record>>;

    /// Persist a record for a user and pointer, replacing any previous value
    fn store(&self, user_id: &str, pointer: &Pointer, record: &Record) -> Result<()>;

    /// Remove the persisted record for a user and pointer
    fn remove(&self, user_id: &str, pointer: &Pointer) -> Result<()>;
}

/// In-memory provider, for tests and sessions that need no durability
#[derive(Debug, Default)]
pub struct MemoryStorageProvider {
    records: RwLock<HashMap<(String, Pointer), Record>>,
}

impl MemoryStorageProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted records across all users
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// True if nothing is persisted
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl StorageProvider for MemoryStorageProvider {
    fn load(&self, user_id: &str, pointer: &Pointer) -> Result<Option<Record>> {
        Ok(self
            .records
            .read()
            .get(&(user_id.to_string(), pointer.clone()))
            .cloned())
    }

    fn store(&self, user_id: &str, pointer: &Pointer, record: &Record) -> Result<()> {
        self.records
            .write()
            .insert((user_id.to_string(), pointer.clone()), record.clone());
        Ok(())
    }

    fn remove(&self, user_id: &str, pointer: &Pointer) -> Result<()> {
        self.records
            .write()
            .remove(&(user_id.to_string(), pointer.clone()));
        Ok(())
    }
}

/// File-backed provider: one JSON document per record
///
/// Layout: `<root>/<user_id>/<table>/<id>.json`. Writes go through a
/// temporary file in the same directory followed by a rename, so a crash
/// mid-write leaves either the old document or the new one, never a torn mix.
#[derive(Debug)]
pub struct FileStorageProvider {
    root: PathBuf,
}

impl FileStorageProvider {
    /// Open a provider rooted at the given directory, creating it if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| Error::Storage(e.to_string()))?;
        Ok(FileStorageProvider { root })
    }

    fn record_path(&self, user_id: &str, pointer: &Pointer) -> PathBuf {
        self.root
            .join(sanitize(user_id))
            .join(sanitize(pointer.table.as_str()))
            .join(format!("{}.json", sanitize(&pointer.id)))
    }
}

// Keep ids usable as file names; anything surprising becomes '_'.
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().expect("record path has a parent");
    fs::create_dir_all(parent)?;
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}

impl StorageProvider for FileStorageProvider {
    fn load(&self, user_id: &str, pointer: &Pointer) -> Result<Option<Record>> {
        let path = self.record_path(user_id, pointer);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Storage(e.to_string())),
        };
        let record = serde_json::from_slice(&bytes)?;
        Ok(Some(record))
    }

    fn store(&self, user_id: &str, pointer: &Pointer, record: &Record) -> Result<()> {
        let path = self.record_path(user_id, pointer);
        let bytes = serde_json::to_vec(record)?;
        write_atomically(&path, &bytes).map_err(|e| Error::Storage(e.to_string()))?;
        debug!(%pointer, user_id, "persisted record");
        Ok(())
    }

    fn remove(&self, user_id: &str, pointer: &Pointer) -> Result<()> {
        let path = self.record_path(user_id, pointer);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(e.to_string())),
        }
    }
}
