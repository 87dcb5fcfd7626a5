//! Config operations: template generation, key lookup, listing, and result types.
//!
//! Provides the logic behind `config list`, `config gen`, `config get`, and the
//! `ConfigResult` enum that callers use to display results.

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;

use crate::config::Configuration;
use crate::error::TypefigError;
use crate::schema::Schema;

/// Result of a config operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigResult {
    /// A generated TOML template string.
    Template(String),
    /// Confirmation that a template was written to a file.
    TemplateWritten { path: PathBuf },
    /// A setting's resolved value, type, and doc string.
    KeyValue {
        key: String,
        section: Option<String>,
        value: String,
        type_name: String,
        doc: String,
    },
    /// All resolved settings of one section.
    Listing {
        section: Option<String>,
        entries: Vec<(String, String)>,
    },
}

impl fmt::Display for ConfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigResult::Template(t) => write!(f, "{t}"),
            ConfigResult::TemplateWritten { path } => {
                write!(f, "Config template written to {}", path.display())
            }
            ConfigResult::KeyValue {
                key,
                value,
                type_name,
                doc,
                ..
            } => {
                for line in doc.lines() {
                    writeln!(f, "# {line}")?;
                }
                writeln!(f, "# type: {type_name}")?;
                write!(f, "{key} = {value}")
            }
            ConfigResult::Listing { section, entries } => {
                if let Some(name) = section {
                    writeln!(f, "[{name}]")?;
                }
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                Ok(())
            }
        }
    }
}

/// Generate a commented TOML template from the schema's docs, types, guards,
/// and defaults. Every assignment is commented out, so the template loads
/// as an empty configuration.
pub fn generate_template(schema: &Schema) -> String {
    let mut out = String::new();
    for (i, atom) in schema.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for line in atom.doc().lines() {
            out.push_str(&format!("# {line}\n"));
        }
        out.push_str(&format!("# type: {}\n", atom.ty()));
        for guard in atom.guards() {
            out.push_str(&format!("# guard: {}\n", guard.message()));
        }
        out.push_str(&format!(
            "#{} = {}\n",
            atom.name(),
            toml_literal(atom.default_value())
        ));
    }
    out
}

/// Look up one setting, including its type and doc string.
pub fn get_value(
    config: &Configuration,
    key: &str,
    section: Option<&str>,
) -> Result<ConfigResult, TypefigError> {
    let atom = config.get_atom(key, section)?;
    let doc = config
        .schema()
        .get(key)
        .map(|a| a.doc().to_string())
        .unwrap_or_default();
    Ok(ConfigResult::KeyValue {
        key: key.into(),
        section: section.map(str::to_string),
        value: format_value(&atom.value),
        type_name: atom.ty.name(),
        doc,
    })
}

/// List every setting of a section, in schema order.
pub fn list_values(
    config: &Configuration,
    section: Option<&str>,
) -> Result<ConfigResult, TypefigError> {
    let data = config.section(section)?;
    let entries = config
        .schema()
        .iter()
        .filter_map(|atom| data.get(atom.name()))
        .map(|atom| (atom.name.clone(), format_value(&atom.value)))
        .collect();
    Ok(ConfigResult::Listing {
        section: section.map(str::to_string),
        entries,
    })
}

/// Format a coerced value for display.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// Render a value as a TOML literal. TOML has no null, so `None` is written
/// as the string the `Optional` type accepts for it.
fn toml_literal(value: &Value) -> String {
    match value {
        Value::Null => "\"None\"".to_string(),
        other => toml::Value::try_from(other)
            .map(|v| v.to_string())
            .unwrap_or_else(|_| format!("{:?}", other.to_string())),
    }
}
