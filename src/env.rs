use serde_json::Value;

use crate::file::Document;

/// Build a config document layer from environment variables matching `{PREFIX}__*`.
///
/// `PREFIX__KEY` sets `key` in the global section and `PREFIX__SECTION__KEY`
/// sets `key` in `section`. Deeper nesting is ignored. Segments are
/// lowercased.
///
/// Values stay strings: each setting's type descriptor coerces them, the
/// same as string values from a file.
///
/// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
pub fn env_to_document(
    prefix: &str,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Document {
    let needle = format!("{prefix}__");
    let mut doc = Document::new();

    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(&needle) else {
            continue;
        };
        let segments: Vec<String> = rest.split("__").map(str::to_lowercase).collect();
        match segments.as_slice() {
            [key] if !key.is_empty() => {
                doc.insert(key.clone(), Value::String(value));
            }
            [section, key] if !section.is_empty() && !key.is_empty() => {
                let entry = doc
                    .entry(section.clone())
                    .or_insert_with(|| Value::Object(Document::new()));
                if let Value::Object(sub) = entry {
                    sub.insert(key.clone(), Value::String(value));
                }
            }
            _ => {
                tracing::debug!(var = %key, "ignoring environment variable");
            }
        }
    }

    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn global_key() {
        let doc = env_to_document("MYAPP", vars(&[("MYAPP__PORT", "8080")]));
        assert_eq!(doc["port"], json!("8080"));
    }

    #[test]
    fn section_key() {
        let doc = env_to_document("MYAPP", vars(&[("MYAPP__BACKUP__PORT", "90")]));
        assert_eq!(doc["backup"]["port"], json!("90"));
    }

    #[test]
    fn several_keys_in_one_section() {
        let doc = env_to_document(
            "MYAPP",
            vars(&[("MYAPP__EDGE__PORT", "90"), ("MYAPP__EDGE__HOST", "e")]),
        );
        let edge = doc["edge"].as_object().unwrap();
        assert_eq!(edge.len(), 2);
    }

    #[test]
    fn ignores_other_prefixes() {
        let doc = env_to_document(
            "MYAPP",
            vars(&[("OTHER__PORT", "1"), ("MYAPPX__PORT", "2"), ("PATH", "/bin")]),
        );
        assert!(doc.is_empty());
    }

    #[test]
    fn ignores_empty_and_too_deep() {
        let doc = env_to_document(
            "MYAPP",
            vars(&[("MYAPP__", "x"), ("MYAPP__A__B__C", "y"), ("MYAPP____K", "z")]),
        );
        assert!(doc.is_empty());
    }

    #[test]
    fn single_underscore_is_literal() {
        let doc = env_to_document("MYAPP", vars(&[("MYAPP__MAX_CONNECTIONS", "5")]));
        assert_eq!(doc["max_connections"], json!("5"));
    }
}
