//! Dynamic variable resolvers shipped with the registry.

pub mod builtins;
pub mod catalog;

pub use builtins::{BUILTIN_CONTRIBUTOR, BuiltinInfo, BuiltinResolver, BuiltinResolvers};
pub use catalog::ResolverCatalog;
