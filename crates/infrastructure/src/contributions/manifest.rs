//! JSON contribution manifests.
//!
//! A manifest declares the variables one contributor supplies:
//!
//! ```json
//! {
//!   "contributor": "acme.build",
//!   "valueVariables": [
//!     { "name": "build_dir", "description": "Output directory", "initialValue": "target" },
//!     { "name": "session", "readOnly": true, "initializer": { "resolver": "uuid" } }
//!   ],
//!   "dynamicVariables": [
//!     { "name": "home", "resolver": "env_var", "argument": "HOME" },
//!     { "name": "today", "resolver": "current_date", "supportsArgument": true }
//!   ]
//! }
//! ```
//!
//! Resolvers are named by id and looked up in a [`ResolverCatalog`].
//!
//! An `initializer` runs its resolver once, on first read of the variable,
//! while the registry holds its namespace lock. Resolvers used as
//! initializers must not call back into the registry; dynamic variables have
//! no such restriction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use varkit_application::ports::StaticContributions;
use varkit_application::resolvers::ResolverCatalog;
use varkit_domain::{
    DynamicContribution, DynamicResolver, DynamicVariable, ResolverError, ResolverFactory,
    ValueContribution,
};

use crate::serialization::{SerializationError, from_json, read_json_file};

const DEFAULT_CONTRIBUTOR: &str = "manifest";

/// Error type for manifest loading.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest file does not exist.
    #[error("Manifest not found: {0}")]
    NotFound(PathBuf),

    /// The manifest could not be read or parsed.
    #[error("Invalid manifest: {0}")]
    Invalid(#[from] SerializationError),
}

/// Root of a manifest file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Contributor id used in diagnostics.
    #[serde(default)]
    pub contributor: Option<String>,
    /// Value variable entries.
    #[serde(default)]
    pub value_variables: Vec<ValueEntry>,
    /// Dynamic variable entries.
    #[serde(default)]
    pub dynamic_variables: Vec<DynamicEntry>,
}

/// A contributed value variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueEntry {
    /// Variable name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Read-only once initialized
    #[serde(default)]
    pub read_only: bool,
    /// Value applied on first read
    #[serde(default)]
    pub initial_value: Option<String>,
    /// Resolver run once on first read, when there is no initial value
    #[serde(default)]
    pub initializer: Option<InitializerEntry>,
}

/// A resolver invoked once to initialize a value variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializerEntry {
    /// Resolver id
    pub resolver: String,
    /// Argument passed to the resolver
    #[serde(default)]
    pub argument: Option<String>,
}

/// A contributed dynamic variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicEntry {
    /// Variable name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Resolver id
    pub resolver: String,
    /// Whether callers may pass an argument
    #[serde(default)]
    pub supports_argument: bool,
    /// Fixed argument handed to the resolver on every call; callers cannot
    /// pass their own
    #[serde(default)]
    pub argument: Option<String>,
}

/// Loads contribution manifests into [`StaticContributions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestContributions;

impl ManifestContributions {
    /// Loads the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or malformed.
    /// Entries naming an unknown resolver are skipped, not reported.
    pub fn load(path: &Path, catalog: &ResolverCatalog) -> Result<StaticContributions, ManifestError> {
        let manifest: Manifest =
            read_json_file(path)?.ok_or_else(|| ManifestError::NotFound(path.to_path_buf()))?;
        debug!(path = %path.display(), "loaded contribution manifest");
        Ok(Self::build(manifest, catalog))
    }

    /// Parses a manifest from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn parse(json: &str, catalog: &ResolverCatalog) -> Result<StaticContributions, ManifestError> {
        let manifest: Manifest = from_json(json)?;
        Ok(Self::build(manifest, catalog))
    }

    /// Turns parsed entries into contributions.
    #[must_use]
    pub fn build(manifest: Manifest, catalog: &ResolverCatalog) -> StaticContributions {
        let contributor = manifest
            .contributor
            .unwrap_or_else(|| DEFAULT_CONTRIBUTOR.to_string());
        let mut contributions = StaticContributions::new();

        for entry in manifest.value_variables {
            if let Some(contribution) = value_contribution(entry, &contributor, catalog) {
                contributions = contributions.with_value(contribution);
            }
        }
        for entry in manifest.dynamic_variables {
            if let Some(contribution) = dynamic_contribution(entry, &contributor, catalog) {
                contributions = contributions.with_dynamic(contribution);
            }
        }
        contributions
    }
}

/// Builds a value contribution. A resolver-backed initializer is invoked
/// under the registry lock and must not re-enter it.
fn value_contribution(
    entry: ValueEntry,
    contributor: &str,
    catalog: &ResolverCatalog,
) -> Option<ValueContribution> {
    let mut contribution = ValueContribution::new(entry.name, contributor);
    contribution.description = entry.description;
    contribution.read_only = entry.read_only;

    if let Some(value) = entry.initial_value {
        return Some(contribution.with_initial_value(value));
    }
    let Some(initializer) = entry.initializer else {
        return Some(contribution);
    };
    let Some(factory) = catalog.get(&initializer.resolver) else {
        warn!(
            name = %contribution.name,
            resolver = %initializer.resolver,
            contributor,
            "skipping value variable with unknown initializer"
        );
        return None;
    };

    let argument = initializer.argument;
    Some(contribution.with_initializer(move |name: &str| {
        let variable = DynamicVariable::new(name, None, true, Arc::clone(&factory));
        match variable.resolve(argument.as_deref()) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(name, error = %error, "initializer failed, variable left empty");
                None
            }
        }
    }))
}

fn dynamic_contribution(
    entry: DynamicEntry,
    contributor: &str,
    catalog: &ResolverCatalog,
) -> Option<DynamicContribution> {
    let Some(factory) = catalog.get(&entry.resolver) else {
        warn!(
            name = %entry.name,
            resolver = %entry.resolver,
            contributor,
            "skipping dynamic variable with unknown resolver"
        );
        return None;
    };
    let factory: Arc<dyn ResolverFactory> = match entry.argument {
        Some(argument) => Arc::new(BoundArgument { factory, argument }),
        None => factory,
    };

    let mut contribution = DynamicContribution::new(entry.name, factory, contributor);
    contribution.description = entry.description;
    if entry.supports_argument {
        contribution = contribution.with_argument();
    }
    Some(contribution)
}

/// Factory whose resolver always receives a fixed argument.
struct BoundArgument {
    factory: Arc<dyn ResolverFactory>,
    argument: String,
}

impl ResolverFactory for BoundArgument {
    fn create(&self) -> Result<Arc<dyn DynamicResolver>, ResolverError> {
        let inner = self.factory.create()?;
        let argument = self.argument.clone();
        let bound = move |variable: &DynamicVariable,
                          _: Option<&str>|
              -> Result<String, ResolverError> {
            inner.resolve(variable, Some(&argument))
        };
        Ok(Arc::new(bound))
    }
}
