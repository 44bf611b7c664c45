//! Varkit Domain - Core variable types
//!
//! This crate defines the data model of the variable registry: value and
//! dynamic variables, contribution descriptors, the persisted record shape,
//! registry settings, and the error taxonomy.
//! All types here are pure Rust with no I/O dependencies.

pub mod error;
pub mod persistence;
pub mod settings;
pub mod variable;

pub use error::{ResolverError, VariableError, VariableResult};
pub use persistence::{PersistedVariable, PersistedVariables};
pub use settings::RegistrySettings;
pub use variable::{
    DeferredValue, DynamicContribution, DynamicResolver, DynamicVariable, ResolverFactory,
    ValueContribution, ValueInitializer, ValueState, ValueVariable, Variable, VariableKind,
    resolver_factory,
};
