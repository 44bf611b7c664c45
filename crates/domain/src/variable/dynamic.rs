//! Dynamic variable types

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::{ResolverError, VariableError, VariableResult};

/// Computes the value of a dynamic variable.
///
/// Resolvers are invoked on every substitution and never cached, so they may
/// depend on time, process state, or the registry itself.
pub trait DynamicResolver: Send + Sync {
    /// Resolves `variable` for the given argument.
    ///
    /// # Errors
    /// Any error is reported to the caller as `VariableError::ResolutionFailed`.
    fn resolve(
        &self,
        variable: &DynamicVariable,
        argument: Option<&str>,
    ) -> Result<String, ResolverError>;
}

impl<F> DynamicResolver for F
where
    F: Fn(&DynamicVariable, Option<&str>) -> Result<String, ResolverError> + Send + Sync,
{
    fn resolve(
        &self,
        variable: &DynamicVariable,
        argument: Option<&str>,
    ) -> Result<String, ResolverError> {
        self(variable, argument)
    }
}

/// Creates the resolver of a dynamic variable on first use.
pub trait ResolverFactory: Send + Sync {
    /// Builds the resolver.
    ///
    /// # Errors
    /// Returns an error if the resolver cannot be created.
    fn create(&self) -> Result<Arc<dyn DynamicResolver>, ResolverError>;
}

impl<F> ResolverFactory for F
where
    F: Fn() -> Result<Arc<dyn DynamicResolver>, ResolverError> + Send + Sync,
{
    fn create(&self) -> Result<Arc<dyn DynamicResolver>, ResolverError> {
        self()
    }
}

/// Wraps an already constructed resolver as a factory.
pub fn resolver_factory(resolver: impl DynamicResolver + 'static) -> Arc<dyn ResolverFactory> {
    let resolver: Arc<dyn DynamicResolver> = Arc::new(resolver);
    Arc::new(move || Ok(Arc::clone(&resolver)))
}

/// A named, argument-taking computed variable.
pub struct DynamicVariable {
    name: String,
    description: Option<String>,
    supports_argument: bool,
    contributor: Option<String>,
    factory: Arc<dyn ResolverFactory>,
    resolver: OnceLock<Arc<dyn DynamicResolver>>,
}

impl DynamicVariable {
    /// Creates a dynamic variable whose resolver is built lazily by `factory`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        supports_argument: bool,
        factory: Arc<dyn ResolverFactory>,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            supports_argument,
            contributor: None,
            factory,
            resolver: OnceLock::new(),
        }
    }

    /// Records the contributor that registered this variable.
    #[must_use]
    pub fn with_contributor(mut self, contributor: impl Into<String>) -> Self {
        self.contributor = Some(contributor.into());
        self
    }

    /// Returns the variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns true if the variable accepts an argument.
    #[must_use]
    pub const fn supports_argument(&self) -> bool {
        self.supports_argument
    }

    /// Returns the contributor identifier, if any.
    #[must_use]
    pub fn contributor(&self) -> Option<&str> {
        self.contributor.as_deref()
    }

    /// Returns true once the resolver has been created.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.resolver.get().is_some()
    }

    fn bound_resolver(&self) -> VariableResult<Arc<dyn DynamicResolver>> {
        if let Some(resolver) = self.resolver.get() {
            return Ok(Arc::clone(resolver));
        }
        let created = self
            .factory
            .create()
            .map_err(|cause| VariableError::resolution_failed(&self.name, cause))?;
        // A concurrent first call may have won the race; keep whichever was stored.
        Ok(Arc::clone(self.resolver.get_or_init(|| created)))
    }

    /// Resolves the variable for `argument`. An empty argument counts as none.
    ///
    /// # Errors
    /// `UnsupportedArgument` if an argument is given to a variable that takes
    /// none (the resolver is not invoked), `ResolutionFailed` if the factory or
    /// the resolver fails.
    pub fn resolve(&self, argument: Option<&str>) -> VariableResult<String> {
        let argument = argument.filter(|arg| !arg.is_empty());
        if argument.is_some() && !self.supports_argument {
            return Err(VariableError::UnsupportedArgument(self.name.clone()));
        }
        let resolver = self.bound_resolver()?;
        resolver
            .resolve(self, argument)
            .map_err(|cause| VariableError::resolution_failed(&self.name, cause))
    }
}

impl fmt::Debug for DynamicVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicVariable")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("supports_argument", &self.supports_argument)
            .field("contributor", &self.contributor)
            .field("bound", &self.is_bound())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn upper() -> Arc<dyn ResolverFactory> {
        resolver_factory(|_: &DynamicVariable, arg: Option<&str>| -> Result<String, ResolverError> {
            Ok(arg.unwrap_or_default().to_uppercase())
        })
    }

    #[test]
    fn test_resolve_with_argument() {
        let var = DynamicVariable::new("upper", None, true, upper());
        assert_eq!(var.resolve(Some("demo")).unwrap(), "DEMO");
    }

    #[test]
    fn test_unsupported_argument_skips_resolver() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let var = DynamicVariable::new(
            "now",
            None,
            false,
            resolver_factory(move |_: &DynamicVariable, _: Option<&str>| -> Result<String, ResolverError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("noon".into())
            }),
        );

        let err = var.resolve(Some("x")).unwrap_err();
        assert!(matches!(err, VariableError::UnsupportedArgument(name) if name == "now"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(var.resolve(Some("")).unwrap(), "noon");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_factory_runs_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);
        let factory = move || -> Result<Arc<dyn DynamicResolver>, ResolverError> {
            counter.fetch_add(1, Ordering::SeqCst);
            let resolver: Arc<dyn DynamicResolver> = Arc::new(
                |_: &DynamicVariable, _: Option<&str>| -> Result<String, ResolverError> {
                    Ok("v".into())
                },
            );
            Ok(resolver)
        };
        let var = DynamicVariable::new("once", None, false, Arc::new(factory));

        assert!(!var.is_bound());
        var.resolve(None).unwrap();
        var.resolve(None).unwrap();
        assert!(var.is_bound());
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resolver_error_is_wrapped() {
        let var = DynamicVariable::new(
            "broken",
            None,
            false,
            resolver_factory(|_: &DynamicVariable, _: Option<&str>| -> Result<String, ResolverError> {
                Err("no selection".into())
            }),
        );

        match var.resolve(None) {
            Err(VariableError::ResolutionFailed { name, cause }) => {
                assert_eq!(name, "broken");
                assert_eq!(cause.to_string(), "no selection");
            }
            other => panic!("expected ResolutionFailed, got {other:?}"),
        }
    }
}
