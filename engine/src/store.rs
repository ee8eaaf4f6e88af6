//! Local persistence.
//!
//! [`LocalStore`] reads and writes the engine's buckets (records, tombstones,
//! sync metadata, search history) over a [`KeyValueStore`] byte store. Loads
//! never fail: missing or unreadable data falls back to the seed collection or
//! an empty value, and the in-memory state stays authoritative when a write
//! fails.

use crate::{
    error::Result, snapshot::Envelope, Error, RecordCollection, RecordId, SyncMetadata,
};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Storage key for the record collection.
pub const RECORDS_KEY: &str = "records";
/// Storage key for the tombstone set.
pub const TOMBSTONES_KEY: &str = "tombstones";
/// Storage key for sync metadata.
pub const METADATA_KEY: &str = "metadata";
/// Storage key for the search history.
pub const HISTORY_KEY: &str = "searchHistory";

/// A durable byte store addressed by string keys.
pub trait KeyValueStore: Send + Sync {
    /// Read the bytes stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `bytes` under `key`, replacing any previous value.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Delete the value under `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        // Write then rename so a crash never leaves a half-written file
        let target = self.path(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory byte store. Counts writes per key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
    writes: Mutex<HashMap<String, usize>>,
    fail_writes: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new store wrapped in Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// How many times `put` succeeded for `key`.
    pub fn write_count(&self, key: &str) -> usize {
        let writes = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        writes.get(key).copied().unwrap_or(0)
    }

    /// Make every subsequent `put` fail (simulates a full disk).
    pub fn set_fail_writes(&self, fail: bool) {
        *self
            .fail_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = fail;
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        if *self
            .fail_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
        {
            return Err(Error::Persistence(format!("write to '{key}' refused")));
        }

        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), bytes.to_vec());
        *self
            .writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.to_string())
            .or_default() += 1;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// Typed access to the engine's persisted buckets.
///
/// Cheap to clone; clones share the same byte store.
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn KeyValueStore>,
    seed: RecordCollection,
}

impl LocalStore {
    /// Create a local store with an empty seed collection.
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            seed: RecordCollection::new(),
        }
    }

    /// Records returned by [`load_all`](Self::load_all) on first run or when
    /// the stored collection cannot be read.
    pub fn with_seed(mut self, seed: RecordCollection) -> Self {
        self.seed = seed;
        self
    }

    /// Load the record collection, falling back to the seed.
    pub fn load_all(&self) -> RecordCollection {
        self.load(RECORDS_KEY)
            .unwrap_or_else(|| self.seed.clone())
    }

    /// Persist the record collection.
    pub fn save_all(&self, records: &RecordCollection) -> Result<()> {
        self.save(RECORDS_KEY, records)
    }

    pub fn load_metadata(&self) -> SyncMetadata {
        self.load(METADATA_KEY).unwrap_or_default()
    }

    pub fn save_metadata(&self, metadata: &SyncMetadata) -> Result<()> {
        self.save(METADATA_KEY, metadata)
    }

    pub fn load_tombstones(&self) -> BTreeSet<RecordId> {
        self.load(TOMBSTONES_KEY).unwrap_or_default()
    }

    pub fn save_tombstones(&self, tombstones: &BTreeSet<RecordId>) -> Result<()> {
        self.save(TOMBSTONES_KEY, tombstones)
    }

    pub fn load_search_history(&self) -> Vec<String> {
        self.load(HISTORY_KEY).unwrap_or_default()
    }

    pub fn save_search_history(&self, entries: &[String]) -> Result<()> {
        self.save(HISTORY_KEY, entries)
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.backend.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read local bucket");
                return None;
            }
        };

        match Envelope::<T>::from_bytes(&bytes) {
            Ok(envelope) => Some(envelope.data),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding unreadable local bucket");
                None
            }
        }
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let result = Envelope::new(value)
            .to_bytes()
            .and_then(|bytes| self.backend.put(key, &bytes));

        if let Err(e) = &result {
            tracing::warn!(key, error = %e, "Failed to persist local bucket");
        }
        result
    }
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("seed_len", &self.seed.len())
            .finish_non_exhaustive()
    }
}
