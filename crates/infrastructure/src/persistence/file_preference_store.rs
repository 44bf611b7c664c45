//! File-backed preference store.
//!
//! All keys share one JSON document:
//! ```text
//! ~/.config/varkit/preferences.json
//! {
//!   "value_variables": "<blob>"
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;
use varkit_application::ports::{PreferenceStore, StoreError};

use crate::serialization::{SerializationError, read_json_file, write_json_file};

/// Converts a serialization failure into the port's error type.
fn to_store_error(e: SerializationError) -> StoreError {
    match e {
        SerializationError::Io(io_err) => StoreError::Io(io_err),
        other => StoreError::Serialization(other.to_string()),
    }
}

/// Preference store kept in a single JSON file.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    // Serializes read-modify-write cycles from this process.
    write_lock: Mutex<()>,
}

impl FilePreferenceStore {
    /// Creates a store backed by `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Creates a store at the default location.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the platform has no config directory.
    pub fn at_default_location() -> Result<Self, StoreError> {
        Self::default_path()
            .map(Self::new)
            .ok_or_else(|| StoreError::Unavailable("could not determine config directory".into()))
    }

    /// Returns the default store path: `<config_dir>/varkit/preferences.json`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("varkit").join("preferences.json"))
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        Ok(read_json_file(&self.path)
            .map_err(to_store_error)?
            .unwrap_or_default())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        write_json_file(&self.path, &entries).map_err(to_store_error)?;
        debug!(path = %self.path.display(), key, "preferences written");
        Ok(())
    }
}
