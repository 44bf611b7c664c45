//! Expression parser for `${name}` and `${name:argument}` syntax
//!
//! Splits an expression into literal text and variable references, keeping
//! each reference's byte span. Nested references inside a name or argument
//! are captured whole and left for the engine to expand.

use std::ops::Range;

use varkit_domain::{VariableError, VariableResult};

const OPEN: &[u8] = b"${";
const CLOSE: u8 = b'}';
const SEPARATOR: u8 = b':';

/// A variable reference found in an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference<'a> {
    /// Raw name text. May itself contain references.
    pub name: &'a str,

    /// Raw argument text after the first top-level `:`, if present.
    pub argument: Option<&'a str>,

    /// Byte range of the whole `${...}` token in the parsed input.
    pub span: Range<usize>,
}

impl Reference<'_> {
    /// Returns true if the name must be expanded before lookup.
    #[must_use]
    pub fn has_computed_name(&self) -> bool {
        has_references(self.name)
    }
}

/// A piece of a parsed expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment<'a> {
    /// Literal text, copied verbatim.
    Text(&'a str),
    /// A variable reference.
    Reference(Reference<'a>),
}

/// Parses an expression into text and reference fragments.
///
/// A `$` not followed by `{` is plain text.
///
/// # Errors
///
/// Returns `VariableError::UnterminatedToken` with the offset of the `${`
/// that has no matching `}`.
///
/// # Examples
///
/// ```
/// use varkit_application::substitution::parser::{Fragment, parse_expression};
///
/// let fragments = parse_expression("cost: $5, dir: ${workspace_loc:/app}").unwrap();
/// assert_eq!(fragments.len(), 2);
/// assert_eq!(fragments[0], Fragment::Text("cost: $5, dir: "));
/// if let Fragment::Reference(reference) = &fragments[1] {
///     assert_eq!(reference.name, "workspace_loc");
///     assert_eq!(reference.argument, Some("/app"));
/// }
/// ```
pub fn parse_expression(input: &str) -> VariableResult<Vec<Fragment<'_>>> {
    let bytes = input.as_bytes();
    let mut fragments = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if !bytes[pos..].starts_with(OPEN) {
            pos += 1;
            continue;
        }

        let start = pos;
        let body_start = start + OPEN.len();
        let end = find_close(bytes, body_start)
            .ok_or(VariableError::UnterminatedToken { offset: start })?;

        if text_start < start {
            fragments.push(Fragment::Text(&input[text_start..start]));
        }

        let body = &input[body_start..end];
        let (name, argument) = match find_separator(body.as_bytes()) {
            Some(sep) => (&body[..sep], Some(&body[sep + 1..])),
            None => (body, None),
        };
        fragments.push(Fragment::Reference(Reference {
            name,
            argument,
            span: start..end + 1,
        }));

        pos = end + 1;
        text_start = pos;
    }

    if text_start < bytes.len() {
        fragments.push(Fragment::Text(&input[text_start..]));
    }

    Ok(fragments)
}

/// Finds the `}` closing a token whose body starts at `from`.
fn find_close(bytes: &[u8], from: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut pos = from;
    while pos < bytes.len() {
        if bytes[pos..].starts_with(OPEN) {
            depth += 1;
            pos += OPEN.len();
            continue;
        }
        if bytes[pos] == CLOSE {
            depth -= 1;
            if depth == 0 {
                return Some(pos);
            }
        }
        pos += 1;
    }
    None
}

/// Finds the first `:` of a token body that is not inside a nested token.
fn find_separator(body: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut pos = 0;
    while pos < body.len() {
        if body[pos..].starts_with(OPEN) {
            depth += 1;
            pos += OPEN.len();
            continue;
        }
        match body[pos] {
            CLOSE => depth = depth.saturating_sub(1),
            SEPARATOR if depth == 0 => return Some(pos),
            _ => {}
        }
        pos += 1;
    }
    None
}

/// Returns true if the input contains a `${` token start.
#[must_use]
pub fn has_references(input: &str) -> bool {
    input.contains("${")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn references(input: &str) -> Vec<Reference<'_>> {
        parse_expression(input)
            .unwrap()
            .into_iter()
            .filter_map(|fragment| match fragment {
                Fragment::Reference(reference) => Some(reference),
                Fragment::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_simple_reference() {
        let refs = references("${project}");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "project");
        assert_eq!(refs[0].argument, None);
        assert_eq!(refs[0].span, 0..10);
    }

    #[test]
    fn test_parse_reference_with_argument() {
        let refs = references("${env_var:HOME}");
        assert_eq!(refs[0].name, "env_var");
        assert_eq!(refs[0].argument, Some("HOME"));
    }

    #[test]
    fn test_argument_keeps_later_separators() {
        let refs = references("${date:%H:%M}");
        assert_eq!(refs[0].name, "date");
        assert_eq!(refs[0].argument, Some("%H:%M"));
    }

    #[test]
    fn test_empty_argument_is_present() {
        let refs = references("${name:}");
        assert_eq!(refs[0].argument, Some(""));
    }

    #[test]
    fn test_nested_argument_captured_whole() {
        let input = "${upper:${project}-${version}}!";
        let refs = references(input);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "upper");
        assert_eq!(refs[0].argument, Some("${project}-${version}"));
        assert_eq!(&input[refs[0].span.clone()], "${upper:${project}-${version}}");
    }

    #[test]
    fn test_separator_inside_nested_name_is_skipped() {
        let refs = references("${${kind:x}_path:arg}");
        assert_eq!(refs[0].name, "${kind:x}_path");
        assert_eq!(refs[0].argument, Some("arg"));
        assert!(refs[0].has_computed_name());
    }

    #[test]
    fn test_text_fragments_are_preserved() {
        let fragments = parse_expression("Building ${project}...").unwrap();
        assert_eq!(
            fragments,
            vec![
                Fragment::Text("Building "),
                Fragment::Reference(Reference {
                    name: "project",
                    argument: None,
                    span: 9..19,
                }),
                Fragment::Text("..."),
            ]
        );
    }

    #[test]
    fn test_bare_dollar_is_text() {
        let fragments = parse_expression("price $5 and $ {x} and $").unwrap();
        assert_eq!(fragments, vec![Fragment::Text("price $5 and $ {x} and $")]);
    }

    #[test]
    fn test_adjacent_references() {
        let refs = references("${a}${b}${c}");
        let names: Vec<_> = refs.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unterminated_reports_offset() {
        let err = parse_expression("ok ${a} then ${broken").unwrap_err();
        assert!(matches!(err, VariableError::UnterminatedToken { offset: 13 }));
    }

    #[test]
    fn test_unterminated_nested_reports_outer_offset() {
        let err = parse_expression("${outer:${inner}").unwrap_err();
        assert!(matches!(err, VariableError::UnterminatedToken { offset: 0 }));
    }

    #[test]
    fn test_stray_close_brace_is_text() {
        let fragments = parse_expression("a } b").unwrap();
        assert_eq!(fragments, vec![Fragment::Text("a } b")]);
    }

    #[test]
    fn test_multibyte_text_around_reference() {
        let input = "héllo ${wörld} ✓";
        let refs = references(input);
        assert_eq!(refs[0].name, "wörld");
        assert_eq!(&input[refs[0].span.clone()], "${wörld}");
    }

    #[test]
    fn test_has_references() {
        assert!(has_references("a ${b}"));
        assert!(!has_references("a $b {c}"));
    }
}
