//! Preference store port
//!
//! Defines the interface to the durable configuration store that keeps the
//! serialized value variables under a single key.

use std::collections::HashMap;

use parking_lot::Mutex;

/// Errors that can occur during preference store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The store cannot be used (for example, no configuration directory).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Key/value store for serialized preferences.
///
/// Calls are synchronous; the registry waits for `put` to finish before a
/// mutation returns.
pub trait PreferenceStore: Send + Sync {
    /// Reads the blob stored under `key`.
    ///
    /// # Returns
    /// `None` if nothing has been stored under the key yet.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the blob stored under `key`.
    ///
    /// # Errors
    /// Returns an error if the store cannot be written.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Preference store kept in memory, for defaults and tests.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryPreferenceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding one entry.
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.entries.lock().insert(key.into(), value.into());
        store
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
