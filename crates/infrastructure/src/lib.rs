//! Varkit Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod contributions;
pub mod persistence;
pub mod serialization;

pub use contributions::{Manifest, ManifestContributions, ManifestError};
pub use persistence::{FilePreferenceStore, SettingsError, SettingsRepository};
pub use serialization::{
    SerializationError, from_json, read_json_file, to_json_stable, write_json_file,
};
