//! The loaded configuration: validated data atoms per section, plus the
//! schema they were validated against.

use std::path::Path;

use serde_json::Value;

use crate::error::TypefigError;
use crate::file::{self, Document};
use crate::merge::deep_merge;
use crate::resolve::{self, ConfigData, SectionData};
use crate::schema::Schema;
use crate::validate::DataAtom;

/// A validated configuration.
///
/// Every section holds a data atom for every setting in the schema: the
/// global section (`None`) and each named section are seeded with the
/// schema defaults before their own keys are applied.
#[derive(Debug, Clone)]
pub struct Configuration {
    schema: Schema,
    data: ConfigData,
    /// Env and override layers, merged over every later file update.
    layers: Document,
    strict: bool,
}

impl Configuration {
    pub(crate) fn new(schema: Schema, data: ConfigData, layers: Document, strict: bool) -> Self {
        Self {
            schema,
            data,
            layers,
            strict,
        }
    }

    /// Coerced value of `key` in `section` (`None` = global).
    pub fn get(&self, key: &str, section: Option<&str>) -> Result<&Value, TypefigError> {
        self.get_atom(key, section).map(|atom| &atom.value)
    }

    /// Like [`get`](Self::get), returning the whole data atom.
    pub fn get_atom(&self, key: &str, section: Option<&str>) -> Result<&DataAtom, TypefigError> {
        self.section(section)?
            .get(key)
            .ok_or_else(|| TypefigError::UnknownSetting {
                key: key.to_string(),
                section: section.map(str::to_string),
            })
    }

    /// All data atoms of one section.
    pub fn section(&self, section: Option<&str>) -> Result<&SectionData, TypefigError> {
        self.data
            .get(&section.map(str::to_string))
            .ok_or_else(|| TypefigError::UnknownSection(section.unwrap_or_default().to_string()))
    }

    /// Names of the named sections, sorted.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.data.keys().filter_map(|k| k.as_deref())
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.data.contains_key(&Some(section.to_string()))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Load another config file and replace, wholesale, the global section
    /// and every section the file mentions. Sections the file does not
    /// mention keep their current data.
    ///
    /// Environment variables and overrides given at load time still take
    /// precedence over the new file. Nothing is replaced unless the whole
    /// file validates.
    pub fn update_from_file(&mut self, path: &Path) -> Result<(), TypefigError> {
        let content = file::read_file(path)?;
        self.update_from_str(&content, path)
    }

    /// [`update_from_file`](Self::update_from_file) on already-read text.
    pub fn update_from_str(&mut self, content: &str, path: &Path) -> Result<(), TypefigError> {
        let raw = resolve::merge_layers(
            &self.schema,
            vec![(path.to_path_buf(), content.to_string())],
            self.strict,
        )?;
        // Only the layers of sections being rebuilt; the rest are already applied.
        let layers: Document = self
            .layers
            .iter()
            .filter(|(key, _)| {
                self.schema.contains(key.as_str()) || raw.contains_key(key.as_str())
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let fresh = resolve::build_data(&self.schema, deep_merge(raw, layers), self.strict)?;
        tracing::debug!(path = %path.display(), sections = fresh.len(), "configuration updated");
        self.data.extend(fresh);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::server_schema;
    use crate::resolve::{ResolveInput, resolve};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn load(content: &str) -> Configuration {
        let schema = server_schema();
        let input = ResolveInput {
            files: vec![("config.toml".into(), content.to_string())],
            env_vars: vec![],
            env_prefix: None,
            overrides: vec![],
            strict: true,
        };
        let data = resolve(&schema, input).unwrap();
        Configuration::new(schema, data, Document::new(), true)
    }

    #[test]
    fn get_global_and_section() {
        let config = load("[other-server]\nport = 120\nnums = \"2,3,1\"\n");
        assert_eq!(config.get("port", None).unwrap(), &json!(80));
        assert_eq!(config.get("port", Some("other-server")).unwrap(), &json!(120));
        assert_eq!(
            config.get("nums", Some("other-server")).unwrap(),
            &json!([2, 3, 1])
        );
        assert_eq!(config.get("nums", None).unwrap(), &json!([1, 2, 3]));
    }

    #[test]
    fn get_atom_carries_type() {
        let config = load("");
        let atom = config.get_atom("backup", None).unwrap();
        assert_eq!(atom.ty.name(), "Optional[String]");
        assert_eq!(atom.value, json!(null));
    }

    #[test]
    fn unknown_section() {
        let config = load("");
        let err = config.get("port", Some("nowhere")).unwrap_err();
        assert!(matches!(err, TypefigError::UnknownSection(ref s) if s == "nowhere"));
    }

    #[test]
    fn unknown_setting() {
        let config = load("[edge]\nport = 81\n");
        let err = config.get("colour", Some("edge")).unwrap_err();
        assert!(matches!(err, TypefigError::UnknownSetting { ref key, .. } if key == "colour"));
    }

    #[test]
    fn sections_are_listed() {
        let config = load("[b]\nport = 81\n[a]\nport = 82\n");
        let names: Vec<&str> = config.sections().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(config.has_section("a"));
        assert!(!config.has_section("c"));
    }

    #[test]
    fn update_replaces_mentioned_sections_wholesale() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("update.toml");
        fs::write(&path, "[a]\nhost = \"new\"\n").unwrap();

        let mut config = load("port = 90\n[a]\nport = 81\n[b]\nport = 82\n");
        config.update_from_file(&path).unwrap();

        // Section `a` was replaced: its old port override is gone.
        assert_eq!(config.get("port", Some("a")).unwrap(), &json!(80));
        assert_eq!(config.get("host", Some("a")).unwrap(), &json!("new"));
        // Section `b` untouched.
        assert_eq!(config.get("port", Some("b")).unwrap(), &json!(82));
        // Global section replaced by the file's (empty) global keys.
        assert_eq!(config.get("port", None).unwrap(), &json!(80));
    }

    #[test]
    fn update_keeps_runtime_layers() {
        let schema = server_schema();
        let input = ResolveInput {
            files: vec![("config.toml".into(), "[edge]\nhost = \"e\"\n".to_string())],
            env_vars: vec![("APP__EDGE__PORT".into(), "8000".into())],
            env_prefix: Some("APP".into()),
            overrides: vec![("port".into(), json!(9999))],
            strict: true,
        };
        let layers = resolve::runtime_layers(
            input.env_prefix.as_deref(),
            &input.env_vars,
            &input.overrides,
        );
        let data = resolve(&schema, input).unwrap();
        let mut config = Configuration::new(schema, data, layers, true);

        config
            .update_from_str("port = 81\nhost = \"x\"\n", Path::new("update.toml"))
            .unwrap();
        assert_eq!(config.get("port", None).unwrap(), &json!(9999));
        assert_eq!(config.get("host", None).unwrap(), &json!("x"));
        // Not mentioned by the update, so left as loaded.
        assert_eq!(config.get("host", Some("edge")).unwrap(), &json!("e"));
        assert_eq!(config.get("port", Some("edge")).unwrap(), &json!(8000));

        config
            .update_from_str("[edge]\nnums = \"9\"\n", Path::new("update.toml"))
            .unwrap();
        assert_eq!(config.get("host", Some("edge")).unwrap(), &json!("localhost"));
        assert_eq!(config.get("port", Some("edge")).unwrap(), &json!(8000));
        assert_eq!(config.get("nums", Some("edge")).unwrap(), &json!([9]));
    }

    #[test]
    fn failed_update_leaves_data_alone() {
        let mut config = load("[a]\nport = 81\n");
        let err = config
            .update_from_str("[a]\nport = 10\n", Path::new("bad.toml"))
            .unwrap_err();
        assert!(matches!(err, TypefigError::GuardViolation { .. }));
        assert_eq!(config.get("port", Some("a")).unwrap(), &json!(81));
    }

    #[test]
    fn update_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let mut config = load("");
        let err = config.update_from_file(&dir.path().join("none.toml")).unwrap_err();
        assert!(matches!(err, TypefigError::IoError { .. }));
    }
}
