//! File-backed persistence adapters.

mod file_preference_store;
mod settings_repository;

pub use file_preference_store::FilePreferenceStore;
pub use settings_repository::{SettingsError, SettingsRepository};
