//! String substitution
//!
//! Provides parsing and expansion of `${name}` / `${name:argument}` references.
//!
//! # Usage
//!
//! ```
//! use varkit_application::Registry;
//! use varkit_domain::ValueVariable;
//!
//! let registry = Registry::in_memory();
//! registry
//!     .add_variables(vec![ValueVariable::new("project", None, false, Some("demo".into()))])
//!     .unwrap();
//!
//! let result = registry.perform_string_substitution("Building ${project}...", true);
//! assert_eq!(result.unwrap(), "Building demo...");
//! ```

pub mod engine;
pub mod parser;

pub use engine::{Resolved, SubstitutionEngine, VariableLookup};
pub use parser::{Fragment, Reference, has_references, parse_expression};

/// Formats a reference to `name`, ready to embed in an expression.
///
/// Does not check that `name` is registered.
#[must_use]
pub fn generate_variable_expression(name: &str, argument: Option<&str>) -> String {
    match argument {
        Some(argument) => format!("${{{name}:{argument}}}"),
        None => format!("${{{name}}}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_generate_variable_expression() {
        assert_eq!(generate_variable_expression("project", None), "${project}");
        assert_eq!(
            generate_variable_expression("env_var", Some("HOME")),
            "${env_var:HOME}"
        );
    }

    #[test]
    fn test_generated_expression_parses_back() {
        let expression = generate_variable_expression("date", Some("%H:%M"));
        let fragments = parse_expression(&expression).unwrap();
        assert_eq!(
            fragments,
            vec![Fragment::Reference(Reference {
                name: "date",
                argument: Some("%H:%M"),
                span: 0..expression.len(),
            })]
        );
    }
}
