//! Persistence codec for the value-variable namespace.
//!
//! Serializes the persistable value variables into one deterministic JSON
//! blob and overlays a decoded blob onto the contributed defaults.

use std::collections::HashMap;

use tracing::{debug, warn};
use varkit_domain::{PersistedVariable, PersistedVariables, ValueVariable};

/// Error type for codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// JSON deserialization failed.
    #[error("JSON deserialization failed: {0}")]
    Deserialize(serde_json::Error),
}

/// Serializes the persistable part of a namespace.
///
/// Read-only variables and contributed variables that were never initialized
/// are left out. Output uses 2-space indentation, records sorted by name, and
/// a trailing newline.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_namespace<'a, I>(variables: I) -> Result<String, CodecError>
where
    I: IntoIterator<Item = &'a ValueVariable>,
{
    let records = variables
        .into_iter()
        .filter_map(PersistedVariable::capture)
        .collect();
    let document = PersistedVariables::new(records);

    let mut json = serde_json::to_string_pretty(&document)?;
    json.push('\n');
    Ok(json)
}

/// Parses a blob written by [`encode_namespace`].
///
/// Records with an empty name are dropped.
///
/// # Errors
///
/// Returns an error if the blob is not a valid document.
pub fn decode_namespace(blob: &str) -> Result<Vec<PersistedVariable>, CodecError> {
    let document: PersistedVariables =
        serde_json::from_str(blob).map_err(CodecError::Deserialize)?;
    Ok(document
        .variables
        .into_iter()
        .filter(|record| {
            if record.name.is_empty() {
                warn!("ignoring persisted variable with empty name");
            }
            !record.name.is_empty()
        })
        .collect())
}

/// Overlays persisted records onto already loaded contributions.
///
/// Unknown names become plain variables. A registered variable that is not
/// read-only takes the persisted value when that value is non-empty.
pub fn overlay(namespace: &mut HashMap<String, ValueVariable>, records: Vec<PersistedVariable>) {
    for record in records {
        if let Some(existing) = namespace.get_mut(&record.name) {
            match record.value {
                Some(value) if !value.is_empty() && !existing.is_read_only() => {
                    existing.set_value(Some(value));
                }
                _ => debug!(name = %record.name, "kept contributed value"),
            }
            continue;
        }

        let mut variable =
            ValueVariable::new(record.name.clone(), record.description, record.read_only, None);
        variable.set_value(record.value);
        namespace.insert(record.name, variable);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use varkit_domain::ValueContribution;

    fn plain(name: &str, value: Option<&str>, description: Option<&str>) -> ValueVariable {
        let mut variable =
            ValueVariable::new(name, description.map(str::to_string), false, None);
        variable.set_value(value.map(str::to_string));
        variable
    }

    fn observable(namespace: &HashMap<String, ValueVariable>) -> Vec<(String, Option<String>, bool)> {
        let mut triples: Vec<_> = namespace
            .values()
            .map(|v| (v.name().to_string(), v.peek_value().map(str::to_string), v.is_read_only()))
            .collect();
        triples.sort();
        triples
    }

    #[test]
    fn test_encode_is_deterministic() {
        let blob = encode_namespace(&[plain("b", Some("2"), None), plain("a", None, Some("first"))])
            .unwrap();
        assert_eq!(
            blob,
            "{\n  \"schema_version\": 1,\n  \"variables\": [\n    {\n      \"name\": \"a\",\n      \"description\": \"first\",\n      \"read_only\": false\n    },\n    {\n      \"name\": \"b\",\n      \"value\": \"2\",\n      \"read_only\": false\n    }\n  ]\n}\n"
        );
    }

    #[test]
    fn test_round_trip_with_sigils_and_delimiters() {
        let written = vec![
            plain("path", Some("${workspace_loc:/a}/b"), Some("uses ${x} and }")),
            plain("quote", Some("say \"hi\"\n\t\\ {:}"), None),
            plain("empty", Some(""), None),
            plain("unset", None, None),
            plain("unicode", Some("héllo ✓"), Some("ünïcode")),
        ];

        let blob = encode_namespace(&written).unwrap();
        let mut restored = HashMap::new();
        overlay(&mut restored, decode_namespace(&blob).unwrap());

        let expected: HashMap<_, _> = written
            .into_iter()
            .map(|v| (v.name().to_string(), v))
            .collect();
        assert_eq!(observable(&restored), observable(&expected));
        assert_eq!(
            restored["path"].description(),
            Some("uses ${x} and }")
        );
    }

    #[test]
    fn test_read_only_and_uninitialized_contributions_not_written() {
        let mut read_only = ValueVariable::new("ro", None, true, Some("fixed".into()));
        read_only.initialize();
        let lazy = ValueContribution::new("lazy", "core")
            .with_initial_value("default")
            .into_variable();

        let blob = encode_namespace(&[read_only, lazy, plain("kept", Some("v"), None)]).unwrap();
        let names: Vec<_> = decode_namespace(&blob)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["kept"]);
    }

    #[test]
    fn test_overlay_respects_contributions() {
        let mut namespace = HashMap::new();
        for contribution in [
            ValueContribution::new("editable", "core").with_initial_value("default"),
            ValueContribution::new("locked", "core").with_initial_value("fixed").read_only(),
            ValueContribution::new("blank", "core").with_initial_value("default"),
        ] {
            let variable = contribution.into_variable();
            namespace.insert(variable.name().to_string(), variable);
        }

        overlay(
            &mut namespace,
            vec![
                PersistedVariable {
                    name: "editable".into(),
                    value: Some("user".into()),
                    description: Some("ignored".into()),
                    read_only: false,
                },
                PersistedVariable {
                    name: "locked".into(),
                    value: Some("user".into()),
                    description: None,
                    read_only: false,
                },
                PersistedVariable {
                    name: "blank".into(),
                    value: Some(String::new()),
                    description: None,
                    read_only: false,
                },
                PersistedVariable {
                    name: "fresh".into(),
                    value: Some("new".into()),
                    description: None,
                    read_only: false,
                },
            ],
        );

        assert_eq!(namespace.get_mut("editable").unwrap().value(), Some("user"));
        assert!(namespace["editable"].is_contributed());
        assert_eq!(namespace.get_mut("locked").unwrap().value(), Some("fixed"));
        assert_eq!(namespace.get_mut("blank").unwrap().value(), Some("default"));
        assert_eq!(namespace.get_mut("fresh").unwrap().value(), Some("new"));
        assert!(!namespace["fresh"].is_contributed());
    }

    #[test]
    fn test_decode_drops_empty_names() {
        let records =
            decode_namespace(r#"{"variables":[{"name":""},{"name":"ok","value":"1"}]}"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "ok");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_namespace("<valueVariables/>"),
            Err(CodecError::Deserialize(_))
        ));
    }
}
