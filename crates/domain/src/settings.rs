//! Registry settings
//!
//! Tunables for the variable registry, loaded from the settings file.

use serde::{Deserialize, Serialize};

/// Default bound on transitive substitution depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default configuration key for the persisted value variables.
pub const DEFAULT_PREFERENCE_KEY: &str = "value_variables";

/// Registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Maximum nesting of transitive expansions before giving up with a
    /// circular reference error.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Key under which the value-variable blob is stored.
    #[serde(default = "default_preference_key")]
    pub preference_key: String,
}

const fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_preference_key() -> String {
    DEFAULT_PREFERENCE_KEY.to_string()
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            preference_key: default_preference_key(),
        }
    }
}

impl RegistrySettings {
    /// Returns settings with a different recursion bound.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: RegistrySettings = serde_json::from_str(r#"{"max_depth": 8}"#).unwrap();
        assert_eq!(settings.max_depth, 8);
        assert_eq!(settings.preference_key, DEFAULT_PREFERENCE_KEY);
    }

    #[test]
    fn test_default_settings() {
        let settings = RegistrySettings::default();
        assert_eq!(settings.max_depth, DEFAULT_MAX_DEPTH);
    }
}
