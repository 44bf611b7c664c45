//! JSON helpers shared by the file-backed adapters.
//!
//! Everything written to disk goes through [`write_json_file`], so files
//! produced by varkit share one layout: 2-space indentation, keys in source
//! order (use `BTreeMap` for maps), and a trailing newline.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Error type for serialization operations.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// JSON deserialization failed.
    #[error("JSON deserialization failed: {0}")]
    Deserialize(serde_json::Error),

    /// UTF-8 encoding error.
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Serializes a value to deterministic JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_stable<T: Serialize>(value: &T) -> Result<String, SerializationError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;

    let mut json = String::from_utf8(buffer)?;
    json.push('\n');
    Ok(json)
}

/// Deserializes JSON from a string.
///
/// # Errors
///
/// Returns an error if the JSON is invalid or doesn't match the expected type.
pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, SerializationError> {
    serde_json::from_str(json).map_err(SerializationError::Deserialize)
}

/// Reads and parses a JSON file.
///
/// Returns `None` when the file does not exist.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SerializationError> {
    match fs::read_to_string(path) {
        Ok(content) => from_json(&content).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Writes `value` to `path` as stable JSON, creating parent directories.
///
/// The content goes to a sibling temporary file first and is renamed over
/// `path`, so readers never see a half-written file.
///
/// # Errors
///
/// Returns an error if serialization or any file operation fails.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), SerializationError> {
    let json = to_json_stable(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    fs::write(&temp, json)?;
    fs::rename(&temp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_stable_output_layout() {
        let mut map = BTreeMap::new();
        map.insert("z_key", "value1");
        map.insert("a_key", "value2");

        let json = to_json_stable(&map).unwrap();
        assert_eq!(json, "{\n  \"a_key\": \"value2\",\n  \"z_key\": \"value1\"\n}\n");
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let result: Result<BTreeMap<String, String>, _> = from_json("{ not json");
        assert!(matches!(result, Err(SerializationError::Deserialize(_))));
    }

    #[test]
    fn test_read_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let result: Option<BTreeMap<String, String>> =
            read_json_file(&dir.path().join("absent.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_write_creates_parents_and_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/data.json");
        let mut map = BTreeMap::new();
        map.insert("key".to_string(), "${value}".to_string());

        write_json_file(&path, &map).unwrap();
        let restored: Option<BTreeMap<String, String>> = read_json_file(&path).unwrap();
        assert_eq!(restored, Some(map));

        let mut temp = path.as_os_str().to_owned();
        temp.push(".tmp");
        assert!(!Path::new(&temp).exists());
    }
}
