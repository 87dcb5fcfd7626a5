use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::Configuration;
use crate::error::TypefigError;
use crate::file;
use crate::guard::GuardRegistry;
use crate::ops::{self, ConfigResult};
use crate::resolve::{self, ResolveInput};
use crate::schema::Schema;
use crate::types::ConfigAction;

/// Entry point for building a typefig configuration.
pub struct Typefig;

impl Typefig {
    pub fn builder() -> TypefigBuilder {
        TypefigBuilder::new()
    }
}

/// Builder for loading a schema and the layered configuration validated
/// against it.
///
/// The schema comes from exactly one of [`schema()`](Self::schema),
/// [`schema_file()`](Self::schema_file) or [`schema_str()`](Self::schema_str);
/// the last call wins. Guards named in a schema file are looked up among the
/// predicates registered with [`guard()`](Self::guard) before being compiled
/// as expressions, so register them before loading.
pub struct TypefigBuilder {
    schema: Option<SchemaSource>,
    registry: GuardRegistry,
    files: Vec<PathBuf>,
    env_prefix: Option<String>,
    strict: bool,
    overrides: Vec<(String, Value)>,
}

enum SchemaSource {
    Built(Schema),
    File(PathBuf),
    Text(String),
}

impl TypefigBuilder {
    fn new() -> Self {
        Self {
            schema: None,
            registry: GuardRegistry::new(),
            files: Vec::new(),
            env_prefix: None,
            strict: true,
            overrides: Vec::new(),
        }
    }

    /// Use an already-built schema.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(SchemaSource::Built(schema));
        self
    }

    /// Read the schema from a TOML file at load time.
    pub fn schema_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema = Some(SchemaSource::File(path.into()));
        self
    }

    /// Parse the schema from TOML text at load time.
    pub fn schema_str(mut self, text: &str) -> Self {
        self.schema = Some(SchemaSource::Text(text.to_string()));
        self
    }

    /// Register a named guard predicate that schema files can refer to.
    pub fn guard<F>(mut self, name: &str, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.registry.register(name, predicate);
        self
    }

    /// Add a config file. Files are merged in the order they are added: the
    /// last one has the highest priority. A missing file is an error.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Enable the environment layer: `PREFIX__KEY` sets a global key and
    /// `PREFIX__SECTION__KEY` a key in a section.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Enable or disable strict mode (default: `true`).
    /// In strict mode, unknown keys in any layer produce errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Add an override for `"key"` or `"section.key"`. `None` values are
    /// ignored (useful for optional clap args).
    pub fn set_override<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.overrides.push((key.to_string(), v.into()));
        }
        self
    }

    /// Resolve the schema from whichever source was configured.
    fn effective_schema(&self) -> Result<Schema, TypefigError> {
        match &self.schema {
            Some(SchemaSource::Built(schema)) => Ok(schema.clone()),
            Some(SchemaSource::File(path)) => Schema::from_file(path, &self.registry),
            Some(SchemaSource::Text(text)) => {
                Schema::from_toml(text, Path::new("<schema>"), &self.registry)
            }
            None => Err(TypefigError::SchemaRequired),
        }
    }

    /// Build the `ResolveInput` from current builder state.
    fn build_input(&self) -> Result<ResolveInput, TypefigError> {
        let files = file::load_files(&self.files)?;
        let env_vars: Vec<(String, String)> = match &self.env_prefix {
            Some(_) => std::env::vars().collect(),
            None => Vec::new(),
        };

        Ok(ResolveInput {
            files,
            env_vars,
            env_prefix: self.env_prefix.clone(),
            overrides: self.overrides.clone(),
            strict: self.strict,
        })
    }

    /// Load the schema and resolve the configuration through all layers.
    pub fn load(self) -> Result<Configuration, TypefigError> {
        let schema = self.effective_schema()?;
        let input = self.build_input()?;
        let layers = resolve::runtime_layers(
            input.env_prefix.as_deref(),
            &input.env_vars,
            &input.overrides,
        );
        let data = resolve::resolve(&schema, input)?;
        tracing::info!(
            settings = schema.len(),
            files = self.files.len(),
            "configuration loaded"
        );
        Ok(Configuration::new(schema, data, layers, self.strict))
    }

    /// Handle a `ConfigAction` and print the result to stdout.
    pub fn handle_and_print(self, action: &ConfigAction) -> Result<(), TypefigError> {
        let result = self.handle(action)?;
        println!("{result}");
        Ok(())
    }

    /// Handle a `ConfigAction` (list / gen / get).
    pub fn handle(self, action: &ConfigAction) -> Result<ConfigResult, TypefigError> {
        match action {
            ConfigAction::List { section } => {
                let config = self.load()?;
                ops::list_values(&config, section.as_deref())
            }
            ConfigAction::Gen { output } => {
                let template = ops::generate_template(&self.effective_schema()?);
                match output {
                    Some(path) => {
                        if let Some(parent) = path.parent()
                            && !parent.as_os_str().is_empty()
                        {
                            std::fs::create_dir_all(parent).map_err(|e| {
                                TypefigError::IoError {
                                    path: parent.to_path_buf(),
                                    source: e,
                                }
                            })?;
                        }
                        std::fs::write(path, &template).map_err(|e| TypefigError::IoError {
                            path: path.clone(),
                            source: e,
                        })?;
                        Ok(ConfigResult::TemplateWritten { path: path.clone() })
                    }
                    None => Ok(ConfigResult::Template(template)),
                }
            }
            ConfigAction::Get { key, section } => {
                let config = self.load()?;
                ops::get_value(&config, key, section.as_deref())
            }
        }
    }
}
