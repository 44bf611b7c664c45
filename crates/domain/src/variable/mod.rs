//! Variable domain types

mod contribution;
mod dynamic;
mod value;

use std::sync::Arc;

pub use contribution::{DynamicContribution, ValueContribution};
pub use dynamic::{DynamicResolver, DynamicVariable, ResolverFactory, resolver_factory};
pub use value::{DeferredValue, ValueInitializer, ValueState, ValueVariable};

/// The two independent variable namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VariableKind {
    /// User-settable string variables; consulted first during substitution.
    Value,
    /// Resolver-backed computed variables.
    Dynamic,
}

impl VariableKind {
    /// Returns a human-readable name for the kind.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Value => "Value",
            Self::Dynamic => "Dynamic",
        }
    }
}

/// A registered variable of either kind.
#[derive(Debug, Clone)]
pub enum Variable {
    /// A value variable snapshot.
    Value(ValueVariable),
    /// A shared dynamic variable.
    Dynamic(Arc<DynamicVariable>),
}

impl Variable {
    /// Returns the variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Value(var) => var.name(),
            Self::Dynamic(var) => var.name(),
        }
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Value(var) => var.description(),
            Self::Dynamic(var) => var.description(),
        }
    }

    /// Returns which namespace the variable lives in.
    #[must_use]
    pub const fn kind(&self) -> VariableKind {
        match self {
            Self::Value(_) => VariableKind::Value,
            Self::Dynamic(_) => VariableKind::Dynamic,
        }
    }
}
