//! Contribution sources backed by files.

mod manifest;

pub use manifest::{
    DynamicEntry, InitializerEntry, Manifest, ManifestContributions, ManifestError, ValueEntry,
};
