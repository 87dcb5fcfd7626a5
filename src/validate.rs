//! Value validation and strict-mode key checking.
//!
//! [`validate`] turns one raw value into a [`DataAtom`] by coercing it through
//! the setting's type and then running its guards.
//!
//! [`check_top_level`] rejects a top-level key that is neither a setting nor
//! a table (a section), in every mode. [`validate_unknown_keys`] is the
//! strict-mode check on the rest: every key inside a section must be a
//! setting, and each offender is reported with its file path and best-effort
//! line number.

use std::path::Path;

use serde_json::Value;

use crate::descriptor::TypeDesc;
use crate::error::TypefigError;
use crate::file::Document;
use crate::guard::check_guards;
use crate::schema::{Schema, SchemaAtom};

/// The validated, coerced value of one setting in one section.
#[derive(Debug, Clone, PartialEq)]
pub struct DataAtom {
    pub name: String,
    pub ty: TypeDesc,
    pub value: Value,
}

/// Coerce `raw` through the atom's type, then run its guards on the result.
///
/// Nothing is substituted on failure: the parse or guard error is returned.
pub fn validate(raw: &Value, atom: &SchemaAtom) -> Result<DataAtom, TypefigError> {
    let value = atom
        .ty()
        .parse(raw)
        .map_err(|source| TypefigError::InvalidValue {
            key: atom.name().to_string(),
            section: None,
            source,
        })?;
    check_guards(atom.name(), &value, atom.guards())?;
    Ok(DataAtom {
        name: atom.name().to_string(),
        ty: atom.ty().clone(),
        value,
    })
}

/// The data atom a setting holds when nothing overrides it.
pub fn default_atom(atom: &SchemaAtom) -> DataAtom {
    DataAtom {
        name: atom.name().to_string(),
        ty: atom.ty().clone(),
        value: atom.default_value().clone(),
    }
}

/// Fail with `UnknownSetting` on the first top-level key that is neither a
/// setting nor a section table.
pub fn check_top_level(schema: &Schema, doc: &Document) -> Result<(), TypefigError> {
    match doc
        .iter()
        .find(|(key, value)| !schema.contains(key) && !value.is_object())
    {
        Some((key, _)) => Err(TypefigError::UnknownSetting {
            key: key.clone(),
            section: None,
        }),
        None => Ok(()),
    }
}

/// Dotted `section.key` paths of every section key the schema does not know.
/// Top-level keys are [`check_top_level`]'s concern.
pub fn unknown_keys(schema: &Schema, doc: &Document) -> Vec<String> {
    let mut unknown = Vec::new();
    for (key, value) in doc {
        if schema.contains(key) {
            continue;
        }
        if let Value::Object(section) = value {
            unknown.extend(
                section
                    .keys()
                    .filter(|k| !schema.contains(k))
                    .map(|k| format!("{key}.{k}")),
            );
        }
    }
    unknown
}

/// Validate that a config file contains no keys unknown to `schema`.
///
/// `content` is the file's source text, used only to find line numbers.
pub fn validate_unknown_keys(
    schema: &Schema,
    doc: &Document,
    content: &str,
    path: &Path,
) -> Result<(), TypefigError> {
    let unknown = unknown_keys(schema, doc);
    if unknown.is_empty() {
        return Ok(());
    }

    let errors: Vec<TypefigError> = unknown
        .into_iter()
        .map(|key| {
            let line = find_key_line(content, &key);
            TypefigError::UnknownKey {
                key,
                path: path.to_path_buf(),
                line,
            }
        })
        .collect();

    Err(TypefigError::UnknownKeys(errors))
}

/// Find the 1-indexed line number for a key in TOML content.
///
/// For `"section.key"`, tracks the current `[section]` header while scanning
/// and only matches the leaf key inside the right section. Handles bare and
/// quoted section headers; does not handle inline tables. Returns 0 if the
/// key cannot be located.
fn find_key_line(content: &str, dotted_key: &str) -> usize {
    let (section, leaf) = match dotted_key.rsplit_once('.') {
        Some((section, leaf)) => (Some(section), leaf),
        None => (None, dotted_key),
    };

    let mut current: Option<String> = None;

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && !trimmed.starts_with("[[") {
            let header = trimmed
                .trim_start_matches('[')
                .split(']')
                .next()
                .unwrap_or_default()
                .trim()
                .trim_matches('"');
            current = Some(header.to_string());
            continue;
        }

        if current.as_deref() == section
            && let Some(after_key) = trimmed.strip_prefix(leaf)
            && after_key.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TypeError;
    use crate::file::parse_document;
    use crate::fixtures::test::server_schema;
    use serde_json::json;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("/test/config.toml")
    }

    fn check(content: &str) -> Result<(), TypefigError> {
        let doc = parse_document(content, &path()).unwrap();
        validate_unknown_keys(&server_schema(), &doc, content, &path())
    }

    #[test]
    fn validate_coerces() {
        let schema = server_schema();
        let atom = validate(&json!("2,3,1"), schema.get("nums").unwrap()).unwrap();
        assert_eq!(atom.value, json!([2, 3, 1]));
        assert_eq!(atom.name, "nums");
        assert_eq!(atom.ty, TypeDesc::list(TypeDesc::Int));
    }

    #[test]
    fn validate_runs_guards_on_coerced_value() {
        let schema = server_schema();
        let port = schema.get("port").unwrap();
        assert_eq!(validate(&json!("90"), port).unwrap().value, json!(90));
        match validate(&json!(50), port).unwrap_err() {
            TypefigError::GuardViolation { message, value, .. } => {
                assert_eq!(message, "port must be at least 80");
                assert_eq!(value, json!(50));
            }
            other => panic!("Expected GuardViolation, got {other:?}"),
        }
    }

    #[test]
    fn validate_reports_parse_failure() {
        let schema = server_schema();
        let err = validate(&json!("abc"), schema.get("port").unwrap()).unwrap_err();
        assert!(matches!(
            err,
            TypefigError::InvalidValue {
                source: TypeError::Conversion { .. },
                ..
            }
        ));
        let err = validate(&json!(""), schema.get("nums").unwrap()).unwrap_err();
        assert!(matches!(
            err,
            TypefigError::InvalidValue {
                source: TypeError::Malformed { .. },
                ..
            }
        ));
    }

    #[test]
    fn known_keys_and_sections_pass() {
        let content = "port = 81\nnums = \"1\"\n\n[other-server]\nport = 120\nnums = \"2,3,1\"\n";
        assert!(check(content).is_ok());
    }

    #[test]
    fn empty_content_ok() {
        assert!(check("").is_ok());
    }

    #[test]
    fn unknown_top_level_scalar_is_unknown_setting() {
        let content = "port = 81\ntypo_key = 42\n";
        let doc = parse_document(content, &path()).unwrap();
        match check_top_level(&server_schema(), &doc).unwrap_err() {
            TypefigError::UnknownSetting { key, section } => {
                assert_eq!(key, "typo_key");
                assert_eq!(section, None);
            }
            other => panic!("Expected UnknownSetting, got: {other:?}"),
        }
        // Left to the top-level check, not reported twice.
        assert!(check(content).is_ok());
    }

    #[test]
    fn top_level_settings_and_tables_pass() {
        let doc = parse_document("port = 81\n[edge]\ntypo = 1\n", &path()).unwrap();
        assert!(check_top_level(&server_schema(), &doc).is_ok());
    }

    #[test]
    fn unknown_key_inside_section() {
        let content = "port = 81\n[backup-site]\nhost = \"b\"\ntypo = 1\n";
        match check(content).unwrap_err() {
            TypefigError::UnknownKeys(keys) => match &keys[0] {
                TypefigError::UnknownKey { key, line, .. } => {
                    assert_eq!(key, "backup-site.typo");
                    assert_eq!(*line, 4);
                }
                other => panic!("Expected UnknownKey, got: {other:?}"),
            },
            other => panic!("Expected UnknownKeys, got: {other:?}"),
        }
    }

    #[test]
    fn multiple_unknown_keys() {
        match check("[a]\ntypo1 = 1\ntypo2 = 2\n").unwrap_err() {
            TypefigError::UnknownKeys(keys) => assert_eq!(keys.len(), 2),
            other => panic!("Expected UnknownKeys, got: {other:?}"),
        }
    }

    #[test]
    fn line_number_not_confused_by_same_leaf_elsewhere() {
        let content = "typo = 1\n[a]\nport = 90\n[b]\ntypo = 2\n";
        assert_eq!(find_key_line(content, "typo"), 1);
        assert_eq!(find_key_line(content, "b.typo"), 5);
        assert_eq!(find_key_line(content, "a.typo"), 0);
    }

    #[test]
    fn find_key_line_quoted_header() {
        let content = "[\"my.site\"]\nport = 1\nbogus = 2\n";
        assert_eq!(find_key_line(content, "my.site.bogus"), 3);
    }

    #[test]
    fn find_key_line_missing() {
        assert_eq!(find_key_line("a = 1\n", "zzz"), 0);
    }
}
