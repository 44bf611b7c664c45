//! Process-wide default registry.
//!
//! Code that cannot have a [`Registry`] passed in can share this one.
//! Everything else should construct its own.

use std::sync::OnceLock;

use crate::registry::Registry;

static DEFAULT: OnceLock<Registry> = OnceLock::new();

/// Installs the process-wide registry.
///
/// # Errors
///
/// Gives `registry` back if a default is already in place, including the
/// in-memory fallback created by an earlier [`default_registry`] call.
pub fn install_default(registry: Registry) -> Result<(), Registry> {
    DEFAULT.set(registry)
}

/// Returns the process-wide registry, creating an empty in-memory one if
/// none was installed.
pub fn default_registry() -> &'static Registry {
    DEFAULT.get_or_init(Registry::in_memory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_created_once() {
        let first = default_registry();
        let second = default_registry();
        assert!(std::ptr::eq(first, second));
        assert!(install_default(Registry::in_memory()).is_err());
    }
}
