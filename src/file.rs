//! Document loading: scoped file reads and TOML decoding.
//!
//! Everything downstream works on already-decoded documents
//! ([`Document`], a JSON object), so this is the only module that knows the
//! on-disk format. Files are read whole before any parsing starts.

use std::path::{Path, PathBuf};

use serde_json::{Map, Number, Value};

use crate::error::TypefigError;

/// A decoded configuration or schema document.
pub type Document = Map<String, Value>;

/// Read a file into memory, mapping failures to [`TypefigError::IoError`].
pub fn read_file(path: &Path) -> Result<String, TypefigError> {
    std::fs::read_to_string(path).map_err(|e| TypefigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read every file in order. Unlike search-path discovery, every path here
/// was named explicitly, so a missing file is an error.
pub fn load_files(paths: &[PathBuf]) -> Result<Vec<(PathBuf, String)>, TypefigError> {
    paths
        .iter()
        .map(|path| Ok((path.clone(), read_file(path)?)))
        .collect()
}

/// Decode TOML text into a [`Document`].
pub fn parse_document(content: &str, path: &Path) -> Result<Document, TypefigError> {
    let table: toml::Table = toml::from_str(content).map_err(|e| TypefigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(table_to_document(table))
}

pub fn table_to_document(table: toml::Table) -> Document {
    table
        .into_iter()
        .map(|(k, v)| (k, toml_to_json(v)))
        .collect()
}

/// Convert a TOML value into the neutral value model. Datetimes become
/// their RFC 3339 text.
pub fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(table_to_document(table)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parse_scalars_and_sections() {
        let doc = parse_document(
            "port = 80\nratio = 0.5\nname = \"x\"\n[other]\nport = 120\n",
            Path::new("a.toml"),
        )
        .unwrap();
        assert_eq!(doc["port"], json!(80));
        assert_eq!(doc["ratio"], json!(0.5));
        assert_eq!(doc["name"], json!("x"));
        assert_eq!(doc["other"]["port"], json!(120));
    }

    #[test]
    fn document_keeps_key_order() {
        let doc = parse_document("zeta = 1\nalpha = 2\n", Path::new("a.toml")).unwrap();
        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn datetimes_become_strings() {
        let doc = parse_document("when = 1979-05-27T07:32:00Z\n", Path::new("a.toml")).unwrap();
        assert_eq!(doc["when"], json!("1979-05-27T07:32:00Z"));
    }

    #[test]
    fn non_finite_floats_become_strings() {
        let doc = parse_document("x = nan\n", Path::new("a.toml")).unwrap();
        assert_eq!(doc["x"], json!("NaN"));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = parse_document("port = = 3", Path::new("bad.toml")).unwrap_err();
        match err {
            TypefigError::ParseError { path, .. } => assert_eq!(path, PathBuf::from("bad.toml")),
            other => panic!("Expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn load_files_in_order() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.toml");
        let b = dir.path().join("b.toml");
        fs::write(&a, "port = 1\n").unwrap();
        fs::write(&b, "port = 2\n").unwrap();

        let files = load_files(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].0, a);
        assert_eq!(files[1].1, "port = 2\n");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = load_files(&[dir.path().join("nope.toml")]).unwrap_err();
        assert!(matches!(err, TypefigError::IoError { .. }));
    }
}
