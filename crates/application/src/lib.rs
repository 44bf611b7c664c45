//! Varkit Application - Variable registry and substitution
//!
//! This crate defines the application layer with:
//! - The [`Registry`] owning value and dynamic variables
//! - The substitution engine and its expression parser
//! - Change notification and the persistence codec
//! - Port traits for contribution sources and the durable store
//! - Built-in dynamic resolvers

pub mod codec;
pub mod global;
pub mod notifier;
pub mod ports;
pub mod registry;
pub mod resolvers;
pub mod substitution;

pub use codec::{CodecError, decode_namespace, encode_namespace};
pub use global::{default_registry, install_default};
pub use notifier::{ChangeKind, ChangeNotifier, VariableEvent, VariableListener};
pub use ports::{
    ContributionSource, InMemoryPreferenceStore, NoContributions, PreferenceStore,
    StaticContributions, StoreError,
};
pub use registry::Registry;
pub use resolvers::{BuiltinResolvers, ResolverCatalog};
pub use substitution::generate_variable_expression;
