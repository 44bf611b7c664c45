//! Substitution engine
//!
//! Expands `${...}` references recursively against a [`VariableLookup`].
//! Arguments are expanded before the enclosing reference is resolved, and
//! every replacement is expanded again before being spliced in. A stack of
//! the names currently being expanded detects cycles, and the nesting of
//! references is capped at the configured depth so deeply nested input fails
//! with an error instead of exhausting the stack.

use std::sync::Arc;

use tracing::trace;
use varkit_domain::{DynamicVariable, VariableError, VariableResult};

use super::parser::{Fragment, Reference, has_references, parse_expression};

/// Outcome of looking a name up for substitution.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// A value variable's current value (already initialized).
    Value(Option<String>),
    /// A dynamic variable, to be invoked outside any registry lock.
    Dynamic(Arc<DynamicVariable>),
    /// Registered in neither namespace.
    Undefined,
}

/// Source of variables for the engine.
pub trait VariableLookup {
    /// Looks a name up for substitution. Value variables take precedence and
    /// their deferred initialization runs here.
    fn lookup(&self, name: &str) -> Resolved;

    /// Returns true if the name is registered in either namespace.
    ///
    /// Must not initialize values or invoke resolvers.
    fn is_defined(&self, name: &str) -> bool;
}

/// One substitution or validation pass over an expression.
pub struct SubstitutionEngine<'a, L: ?Sized> {
    lookup: &'a L,
    max_depth: usize,
    expanding: Vec<String>,
    nesting: usize,
}

impl<'a, L: VariableLookup + ?Sized> SubstitutionEngine<'a, L> {
    /// Creates an engine over `lookup`, allowing at most `max_depth` nested
    /// transitive expansions and `max_depth` levels of references nested in
    /// names or arguments.
    #[must_use]
    pub const fn new(lookup: &'a L, max_depth: usize) -> Self {
        Self {
            lookup,
            max_depth,
            expanding: Vec::new(),
            nesting: 0,
        }
    }

    /// Expands every reference in `expression`.
    ///
    /// With `report_undefined == false`, an undefined name expands to the
    /// empty string instead of failing. Every other error aborts the call.
    ///
    /// # Errors
    ///
    /// Returns the first error met; no partial result is produced.
    pub fn substitute(mut self, expression: &str, report_undefined: bool) -> VariableResult<String> {
        self.expand(expression, report_undefined)
    }

    /// Checks syntax and that every statically named reference is registered.
    ///
    /// Never invokes a resolver or a deferred initializer.
    ///
    /// # Errors
    ///
    /// Returns `UnterminatedToken` or `UndefinedVariable` for the first problem
    /// found, or `CircularReference` if references nest deeper than allowed.
    pub fn validate(self, expression: &str) -> VariableResult<()> {
        self.check(expression, 0)
    }

    fn expand(&mut self, text: &str, report_undefined: bool) -> VariableResult<String> {
        if !has_references(text) {
            return Ok(text.to_string());
        }

        let mut result = String::with_capacity(text.len());
        for fragment in parse_expression(text)? {
            match fragment {
                Fragment::Text(literal) => result.push_str(literal),
                Fragment::Reference(reference) => {
                    let replacement = self.expand_reference(&reference, report_undefined)?;
                    result.push_str(&replacement);
                }
            }
        }
        Ok(result)
    }

    fn expand_reference(
        &mut self,
        reference: &Reference<'_>,
        report_undefined: bool,
    ) -> VariableResult<String> {
        if self.nesting > self.max_depth {
            return Err(VariableError::CircularReference(reference.name.to_string()));
        }
        self.nesting += 1;
        let result = self.resolve_reference(reference, report_undefined);
        self.nesting -= 1;
        result
    }

    fn resolve_reference(
        &mut self,
        reference: &Reference<'_>,
        report_undefined: bool,
    ) -> VariableResult<String> {
        let name = self.expand(reference.name, report_undefined)?;
        let argument = reference
            .argument
            .map(|argument| self.expand(argument, report_undefined))
            .transpose()?;

        let replacement = match self.lookup.lookup(&name) {
            // Value variables take no argument; one is tolerated and ignored.
            Resolved::Value(value) => value.unwrap_or_default(),
            Resolved::Dynamic(variable) => variable.resolve(argument.as_deref())?,
            Resolved::Undefined if report_undefined => {
                return Err(VariableError::UndefinedVariable(name));
            }
            Resolved::Undefined => {
                trace!(name = %name, "undefined variable expanded to empty string");
                return Ok(String::new());
            }
        };
        trace!(name = %name, "resolved variable reference");

        self.expand_replacement(name, &replacement, report_undefined)
    }

    fn expand_replacement(
        &mut self,
        name: String,
        replacement: &str,
        report_undefined: bool,
    ) -> VariableResult<String> {
        if !has_references(replacement) {
            return Ok(replacement.to_string());
        }
        if self.expanding.len() >= self.max_depth || self.expanding.contains(&name) {
            return Err(VariableError::CircularReference(name));
        }

        self.expanding.push(name);
        let result = self.expand(replacement, report_undefined);
        self.expanding.pop();
        result
    }

    fn check(&self, text: &str, nesting: usize) -> VariableResult<()> {
        for fragment in parse_expression(text)? {
            let Fragment::Reference(reference) = fragment else {
                continue;
            };
            if nesting > self.max_depth {
                return Err(VariableError::CircularReference(reference.name.to_string()));
            }
            self.check(reference.name, nesting + 1)?;
            if let Some(argument) = reference.argument {
                self.check(argument, nesting + 1)?;
            }
            // A computed name is only known after expansion.
            if !reference.has_computed_name() && !self.lookup.is_defined(reference.name) {
                return Err(VariableError::UndefinedVariable(reference.name.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::collections::HashMap;
    use varkit_domain::{ResolverError, resolver_factory};

    #[derive(Default)]
    struct FakeLookup {
        values: HashMap<String, String>,
        dynamics: HashMap<String, Arc<DynamicVariable>>,
        lookups: Cell<usize>,
    }

    impl FakeLookup {
        fn value(mut self, name: &str, value: &str) -> Self {
            self.values.insert(name.to_string(), value.to_string());
            self
        }

        fn dynamic(mut self, name: &str, supports_argument: bool) -> Self {
            let variable = DynamicVariable::new(
                name,
                None,
                supports_argument,
                resolver_factory(
                    |var: &DynamicVariable, arg: Option<&str>| -> Result<String, ResolverError> {
                        match var.name() {
                            "upper" => Ok(arg.unwrap_or_default().to_uppercase()),
                            "echo" => Ok(arg.unwrap_or_default().to_string()),
                            _ => Ok(format!("<{}>", var.name())),
                        }
                    },
                ),
            );
            self.dynamics.insert(name.to_string(), Arc::new(variable));
            self
        }
    }

    impl VariableLookup for FakeLookup {
        fn lookup(&self, name: &str) -> Resolved {
            self.lookups.set(self.lookups.get() + 1);
            if let Some(value) = self.values.get(name) {
                return Resolved::Value(Some(value.clone()));
            }
            self.dynamics
                .get(name)
                .map_or(Resolved::Undefined, |var| Resolved::Dynamic(Arc::clone(var)))
        }

        fn is_defined(&self, name: &str) -> bool {
            self.values.contains_key(name) || self.dynamics.contains_key(name)
        }
    }

    fn substitute(lookup: &FakeLookup, expression: &str) -> VariableResult<String> {
        SubstitutionEngine::new(lookup, 16).substitute(expression, true)
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        let lookup = FakeLookup::default();
        assert_eq!(substitute(&lookup, "no tokens $here {x}").unwrap(), "no tokens $here {x}");
        assert_eq!(lookup.lookups.get(), 0);
    }

    #[test]
    fn test_value_reference() {
        let lookup = FakeLookup::default().value("project", "demo");
        assert_eq!(substitute(&lookup, "Building ${project}...").unwrap(), "Building demo...");
    }

    #[test]
    fn test_argument_resolved_before_outer() {
        let lookup = FakeLookup::default().value("project", "demo").dynamic("upper", true);
        assert_eq!(substitute(&lookup, "${upper:${project}}").unwrap(), "DEMO");
    }

    #[test]
    fn test_value_variable_ignores_argument() {
        let lookup = FakeLookup::default().value("project", "demo");
        assert_eq!(substitute(&lookup, "${project:ignored}").unwrap(), "demo");
    }

    #[test]
    fn test_value_takes_precedence_over_dynamic() {
        let lookup = FakeLookup::default().value("shared", "value").dynamic("shared", false);
        assert_eq!(substitute(&lookup, "${shared}").unwrap(), "value");
    }

    #[test]
    fn test_transitive_expansion() {
        let lookup = FakeLookup::default()
            .value("root", "/srv")
            .value("app", "${root}/app")
            .value("logs", "${app}/logs");
        assert_eq!(substitute(&lookup, "${logs}").unwrap(), "/srv/app/logs");
    }

    #[test]
    fn test_dynamic_result_is_expanded_again() {
        let lookup = FakeLookup::default().value("project", "demo").dynamic("echo", true);
        assert_eq!(substitute(&lookup, "${echo:$${project}}").unwrap(), "$demo");
    }

    #[test]
    fn test_repeated_reference_is_not_a_cycle() {
        let lookup = FakeLookup::default()
            .value("b", "1")
            .value("a", "${b}${b}");
        assert_eq!(substitute(&lookup, "${a}-${a}").unwrap(), "11-11");
    }

    #[test]
    fn test_cycle_is_detected() {
        let lookup = FakeLookup::default().value("a", "${b}").value("b", "${a}");
        let err = substitute(&lookup, "${a}").unwrap_err();
        assert!(matches!(err, VariableError::CircularReference(name) if name == "a"));
    }

    #[test]
    fn test_self_reference_is_detected() {
        let lookup = FakeLookup::default().value("me", "x${me}");
        assert!(matches!(
            substitute(&lookup, "${me}"),
            Err(VariableError::CircularReference(_))
        ));
    }

    #[test]
    fn test_depth_limit() {
        let mut lookup = FakeLookup::default().value("v0", "end");
        for i in 1..10 {
            lookup = lookup.value(&format!("v{i}"), &format!("${{v{}}}", i - 1));
        }
        assert_eq!(
            SubstitutionEngine::new(&lookup, 16).substitute("${v9}", true).unwrap(),
            "end"
        );
        assert!(matches!(
            SubstitutionEngine::new(&lookup, 3).substitute("${v9}", true),
            Err(VariableError::CircularReference(_))
        ));
    }

    fn nested_arguments(levels: usize) -> String {
        format!("{}x{}", "${echo:".repeat(levels), "}".repeat(levels))
    }

    #[test]
    fn test_deep_argument_nesting_is_bounded() {
        let lookup = FakeLookup::default().dynamic("echo", true);
        assert_eq!(substitute(&lookup, &nested_arguments(16)).unwrap(), "x");

        let expression = nested_arguments(5000);
        assert!(matches!(
            SubstitutionEngine::new(&lookup, 64).substitute(&expression, false),
            Err(VariableError::CircularReference(name)) if name == "echo"
        ));
        assert!(matches!(
            SubstitutionEngine::new(&lookup, 64).validate(&expression),
            Err(VariableError::CircularReference(name)) if name == "echo"
        ));
    }

    #[test]
    fn test_deep_name_nesting_is_bounded() {
        let lookup = FakeLookup::default();
        let expression = format!("{}a{}", "${".repeat(5000), "}".repeat(5000));
        assert!(matches!(
            SubstitutionEngine::new(&lookup, 64).substitute(&expression, false),
            Err(VariableError::CircularReference(_))
        ));
        assert!(matches!(
            SubstitutionEngine::new(&lookup, 64).validate(&expression),
            Err(VariableError::CircularReference(_))
        ));
    }

    #[test]
    fn test_undefined_reported() {
        let lookup = FakeLookup::default();
        let err = substitute(&lookup, "${x}").unwrap_err();
        assert!(matches!(err, VariableError::UndefinedVariable(name) if name == "x"));
    }

    #[test]
    fn test_undefined_lenient_is_empty() {
        let lookup = FakeLookup::default().value("a", "A");
        let result = SubstitutionEngine::new(&lookup, 16).substitute("[${x}]${a}", false);
        assert_eq!(result.unwrap(), "[]A");
    }

    #[test]
    fn test_lenient_still_reports_syntax_errors() {
        let lookup = FakeLookup::default();
        let result = SubstitutionEngine::new(&lookup, 16).substitute("${x", false);
        assert!(matches!(result, Err(VariableError::UnterminatedToken { offset: 0 })));
    }

    #[test]
    fn test_unsupported_argument() {
        let lookup = FakeLookup::default().dynamic("now", false);
        assert!(matches!(
            substitute(&lookup, "${now:utc}"),
            Err(VariableError::UnsupportedArgument(name)) if name == "now"
        ));
    }

    #[test]
    fn test_computed_name() {
        let lookup = FakeLookup::default()
            .value("kind", "debug")
            .value("debug_path", "/tmp/debug");
        assert_eq!(substitute(&lookup, "${${kind}_path}").unwrap(), "/tmp/debug");
    }

    #[test]
    fn test_validate_checks_existence_without_lookup() {
        let lookup = FakeLookup::default().value("project", "demo").dynamic("upper", true);
        let engine = SubstitutionEngine::new(&lookup, 16);
        assert!(engine.validate("${upper:${project}} and $5").is_ok());
        assert_eq!(lookup.lookups.get(), 0);

        let err = SubstitutionEngine::new(&lookup, 16)
            .validate("${upper:${missing}}")
            .unwrap_err();
        assert!(matches!(err, VariableError::UndefinedVariable(name) if name == "missing"));
    }

    #[test]
    fn test_validate_syntax() {
        let lookup = FakeLookup::default().value("a", "A");
        let err = SubstitutionEngine::new(&lookup, 16).validate("${a} ${b").unwrap_err();
        assert_eq!(err.offset(), Some(5));
    }

    #[test]
    fn test_validate_skips_computed_name() {
        let lookup = FakeLookup::default().value("kind", "debug");
        assert!(SubstitutionEngine::new(&lookup, 16).validate("${${kind}_path}").is_ok());
    }
}
