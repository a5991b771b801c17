//! Key-value persistence for authoring drafts, rooms, and gameplay progress.
//!
//! Every store reads and writes whole-object JSON snapshots under well-known
//! keys. A missing or malformed snapshot decodes as "absent" so a damaged
//! store never takes a session down with it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::escape::errors::EscapeError;

const TREE_PRIMARY: &str = "escaperoom";

pub const LAYOUT_KEY: &str = "escape:layout";
pub const QUESTIONS_KEY: &str = "escape:questions";
pub const ROOMS_KEY: &str = "escape:rooms";
pub const GAMEPLAY_PREFIX: &str = "escape:gameplay:";
pub const CATALOG_PREFIX: &str = "catalog:";

pub fn gameplay_key(room_code: &str) -> String {
    format!("{}{}", GAMEPLAY_PREFIX, room_code)
}

/// Byte-oriented key-value backend shared by the layout, question, room,
/// and gameplay stores.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, EscapeError>;
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), EscapeError>;
    fn remove(&self, key: &str) -> Result<(), EscapeError>;
    /// Keys beginning with `prefix`, in ascending order.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, EscapeError>;
}

/// Handle passed to every component; constructed once per session.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Read a snapshot, treating any storage or decode failure as absent.
pub fn load_snapshot<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let bytes = match store.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(e) => {
            warn!("Storage read failed for {}: {} (treating as empty)", key, e);
            return None;
        }
    };
    match serde_json::from_slice::<T>(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Malformed snapshot under {}: {} (treating as empty)", key, e);
            None
        }
    }
}

/// Write a snapshot, returning the storage error to the caller.
pub fn save_snapshot<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), EscapeError> {
    let bytes = serde_json::to_vec(value)?;
    store.put(key, bytes)
}

/// Write a snapshot, logging and discarding any failure.
pub fn save_snapshot_lossy<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    if let Err(e) = save_snapshot(store, key, value) {
        warn!("Storage write failed for {}: {} (continuing)", key, e);
    }
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct SledStoreBuilder {
    path: PathBuf,
    temporary: bool,
}

impl SledStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temporary: false,
        }
    }

    /// Remove the database files when the store is dropped.
    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    pub fn open(self) -> Result<SledStore, EscapeError> {
        SledStore::open_with_options(self.path, self.temporary)
    }
}

/// Sled-backed persistence used by the CLI.
pub struct SledStore {
    _db: sled::Db,
    primary: sled::Tree,
}

impl SledStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EscapeError> {
        Self::open_with_options(path, false)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, temporary: bool) -> Result<Self, EscapeError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::Config::new()
            .path(path_ref)
            .temporary(temporary)
            .open()?;
        let primary = db.open_tree(TREE_PRIMARY)?;
        debug!("Opened escape room store at {}", path_ref.display());
        Ok(Self { _db: db, primary })
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, EscapeError> {
        Ok(self.primary.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), EscapeError> {
        self.primary.insert(key.as_bytes(), value)?;
        self.primary.flush()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), EscapeError> {
        self.primary.remove(key.as_bytes())?;
        self.primary.flush()?;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, EscapeError> {
        let mut keys = Vec::new();
        for entry in self.primary.scan_prefix(prefix.as_bytes()) {
            let (key, _) = entry?;
            keys.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(keys)
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, EscapeError> {
        self.entries.lock().map_err(|_| {
            EscapeError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "memory store lock poisoned",
            ))
        })
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, EscapeError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), EscapeError> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), EscapeError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, EscapeError> {
        let mut keys: Vec<String> = self
            .lock()?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}
