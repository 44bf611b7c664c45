//! Contribution descriptors
//!
//! Variable definitions supplied at registry initialization by an external
//! contribution source.

use std::sync::Arc;

use super::dynamic::{DynamicVariable, ResolverFactory};
use super::value::{DeferredValue, ValueInitializer, ValueVariable};

/// A contributed value variable definition.
#[derive(Debug, Clone)]
pub struct ValueContribution {
    /// Variable name.
    pub name: String,
    /// Human-readable description.
    pub description: Option<String>,
    /// Whether the variable is read-only once initialized.
    pub read_only: bool,
    /// What the first read produces.
    pub default: DeferredValue,
    /// Identifier of the contributor, for diagnostics.
    pub contributor: String,
}

impl ValueContribution {
    /// Creates a contribution with no description and no default.
    #[must_use]
    pub fn new(name: impl Into<String>, contributor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            read_only: false,
            default: DeferredValue::None,
            contributor: contributor.into(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the variable read-only.
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Sets an explicit initial value.
    #[must_use]
    pub fn with_initial_value(mut self, value: impl Into<String>) -> Self {
        self.default = DeferredValue::Value(value.into());
        self
    }

    /// Sets a one-shot initializer.
    #[must_use]
    pub fn with_initializer(mut self, initializer: impl ValueInitializer + 'static) -> Self {
        self.default = DeferredValue::initializer(initializer);
        self
    }

    /// Builds the registered variable.
    #[must_use]
    pub fn into_variable(self) -> ValueVariable {
        ValueVariable::contributed(
            self.name,
            self.description,
            self.read_only,
            self.default,
            self.contributor,
        )
    }
}

/// A contributed dynamic variable definition.
#[derive(Clone)]
pub struct DynamicContribution {
    /// Variable name.
    pub name: String,
    /// Human-readable description.
    pub description: Option<String>,
    /// Whether the resolver accepts an argument.
    pub supports_argument: bool,
    /// Builds the resolver on first use.
    pub factory: Arc<dyn ResolverFactory>,
    /// Identifier of the contributor, for diagnostics.
    pub contributor: String,
}

impl DynamicContribution {
    /// Creates a contribution backed by `factory`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        factory: Arc<dyn ResolverFactory>,
        contributor: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            supports_argument: false,
            factory,
            contributor: contributor.into(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Allows an argument to be passed to the resolver.
    #[must_use]
    pub const fn with_argument(mut self) -> Self {
        self.supports_argument = true;
        self
    }

    /// Builds the registered variable.
    #[must_use]
    pub fn into_variable(self) -> DynamicVariable {
        DynamicVariable::new(
            self.name,
            self.description,
            self.supports_argument,
            self.factory,
        )
        .with_contributor(self.contributor)
    }
}

impl std::fmt::Debug for DynamicContribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicContribution")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("supports_argument", &self.supports_argument)
            .field("contributor", &self.contributor)
            .finish_non_exhaustive()
    }
}
