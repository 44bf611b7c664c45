//! Serialization helpers for file-backed adapters.

mod json;

pub use json::{SerializationError, from_json, read_json_file, to_json_stable, write_json_file};
