//! Client-local key/value storage for the persisted session.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage write failed: {0}")]
    Write(String),
}

/// Minimal string key/value store (the shape of browser `localStorage`).
///
/// Implementations are synchronous: every backing store the dashboard runs
/// on (memory, a small file, `localStorage`) is.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process store for tests and headless hosts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Write both session halves, or neither.
///
/// If the second write fails the first is rolled back so storage never holds
/// a token without an identity.
pub(crate) fn write_pair(
    store: &dyn KeyValueStore,
    first: (&str, &str),
    second: (&str, &str),
) -> Result<(), StorageError> {
    store.set(first.0, first.1)?;
    if let Err(err) = store.set(second.0, second.1) {
        if let Err(rollback) = store.remove(first.0) {
            tracing::warn!(key = first.0, error = %rollback, "failed to roll back partial session write");
        }
        return Err(err);
    }
    Ok(())
}

/// Remove both keys; attempts both even if the first removal fails.
pub(crate) fn clear_pair(store: &dyn KeyValueStore, a: &str, b: &str) -> Result<(), StorageError> {
    let first = store.remove(a);
    let second = store.remove(b);
    first.and(second)
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use anyhow::Context;

    use super::{KeyValueStore, StorageError};

    /// JSON-file store for native hosts.
    ///
    /// The whole map is rewritten on every mutation; it only ever holds a
    /// couple of small strings.
    #[derive(Debug)]
    pub struct FileStore {
        path: PathBuf,
        lock: Mutex<()>,
    }

    impl FileStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self {
                path: path.into(),
                lock: Mutex::new(()),
            }
        }

        /// `<platform data dir>/hrdesk/session.json`.
        pub fn in_data_dir() -> anyhow::Result<Self> {
            let dir = dirs::data_dir().context("failed to determine platform data directory")?;
            Ok(Self::new(dir.join("hrdesk").join("session.json")))
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        fn read_map(&self) -> Result<HashMap<String, String>, StorageError> {
            match std::fs::read_to_string(&self.path) {
                Ok(raw) => match serde_json::from_str(&raw) {
                    Ok(map) => Ok(map),
                    Err(err) => {
                        // Unreadable file: behave as empty so the session
                        // layer treats it as "no session".
                        tracing::warn!(path = ?self.path, error = %err, "session file is not valid JSON");
                        Ok(HashMap::new())
                    }
                },
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
                Err(err) => Err(StorageError::Unavailable(err.to_string())),
            }
        }

        fn write_map(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| StorageError::Write(e.to_string()))?;
            }
            let raw = serde_json::to_string(map).map_err(|e| StorageError::Write(e.to_string()))?;
            std::fs::write(&self.path, raw).map_err(|e| StorageError::Write(e.to_string()))
        }

        fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>, StorageError> {
            self.lock
                .lock()
                .map_err(|_| StorageError::Unavailable("file store poisoned".to_string()))
        }
    }

    impl KeyValueStore for FileStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            let _guard = self.guard()?;
            Ok(self.read_map()?.remove(key))
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            let _guard = self.guard()?;
            let mut map = self.read_map()?;
            map.insert(key.to_string(), value.to_string());
            self.write_map(&map)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            let _guard = self.guard()?;
            let mut map = self.read_map()?;
            if map.remove(key).is_some() {
                self.write_map(&map)?;
            }
            Ok(())
        }
    }
}
