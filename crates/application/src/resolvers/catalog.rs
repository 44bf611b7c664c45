//! Resolver catalog
//!
//! Maps resolver ids named by contribution manifests to resolver factories.

use std::collections::HashMap;
use std::sync::Arc;

use varkit_domain::{DynamicContribution, ResolverFactory, resolver_factory};

use super::builtins::BuiltinResolvers;

/// Resolver factories keyed by id.
#[derive(Clone, Default)]
pub struct ResolverCatalog {
    factories: HashMap<String, Arc<dyn ResolverFactory>>,
}

impl ResolverCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding every built-in resolver.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        for info in BuiltinResolvers::available() {
            if let Some(resolver) = BuiltinResolvers::resolver(info.id) {
                catalog.register(info.id, resolver_factory(resolver));
            }
        }
        catalog
    }

    /// Returns one dynamic contribution per built-in resolver, named by its id.
    #[must_use]
    pub fn builtin_contributions() -> Vec<DynamicContribution> {
        BuiltinResolvers::contributions()
    }

    /// Registers a factory, returning the one it replaces.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        factory: Arc<dyn ResolverFactory>,
    ) -> Option<Arc<dyn ResolverFactory>> {
        self.factories.insert(id.into(), factory)
    }

    /// Looks up the factory for `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn ResolverFactory>> {
        self.factories.get(id).cloned()
    }

    /// Returns true if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Returns the registered ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl std::fmt::Debug for ResolverCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverCatalog")
            .field("ids", &self.ids())
            .finish()
    }
}
