//! Persisted shape of the value-variable namespace.

use serde::{Deserialize, Serialize};

use crate::variable::ValueVariable;

/// Current schema version of the persisted document.
pub const SCHEMA_VERSION: u32 = 1;

/// One persisted value variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedVariable {
    /// Variable name.
    pub name: String,
    /// Value, absent when the variable holds none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Description, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Read-only flag. Always false for records written by the registry.
    #[serde(default)]
    pub read_only: bool,
}

impl PersistedVariable {
    /// Captures the observable state of a variable.
    ///
    /// Returns `None` for variables that are never persisted: read-only ones,
    /// and contributed ones that have not been initialized yet.
    #[must_use]
    pub fn capture(variable: &ValueVariable) -> Option<Self> {
        if variable.is_read_only() || (variable.is_contributed() && !variable.is_initialized()) {
            return None;
        }
        Some(Self {
            name: variable.name().to_string(),
            value: variable.peek_value().map(str::to_string),
            description: variable.description().map(str::to_string),
            read_only: false,
        })
    }
}

/// The document stored under the registry's preference key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedVariables {
    /// Schema version for migration support.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Persisted records, sorted by name.
    #[serde(default)]
    pub variables: Vec<PersistedVariable>,
}

const fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl PersistedVariables {
    /// Creates a document from records, sorting them by name.
    #[must_use]
    pub fn new(mut variables: Vec<PersistedVariable>) -> Self {
        variables.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            schema_version: SCHEMA_VERSION,
            variables,
        }
    }
}
