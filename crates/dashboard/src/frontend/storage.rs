//! `localStorage`-backed [`KeyValueStore`].

use crate::storage::{KeyValueStore, StorageError};

#[derive(Debug, Clone)]
pub struct BrowserStore {
    storage: web_sys::Storage,
}

impl BrowserStore {
    pub fn local() -> Result<Self, StorageError> {
        let window =
            web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|_| StorageError::Unavailable("localStorage access denied".to_string()))?
            .ok_or_else(|| StorageError::Unavailable("localStorage missing".to_string()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|_| StorageError::Unavailable(format!("cannot read {key}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // Fails on quota exhaustion or in private browsing.
        self.storage
            .set_item(key, value)
            .map_err(|_| StorageError::Write(format!("cannot write {key}")))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|_| StorageError::Write(format!("cannot remove {key}")))
    }
}
