//! Error taxonomy.
//!
//! Two layers: [`TypeError`] is what a [`TypeDesc`](crate::TypeDesc) reports
//! when it cannot coerce a value, with no knowledge of which setting it was
//! working on. [`TypefigError`] is what every public operation returns and
//! carries the setting, section, and file context needed for a user-facing
//! message.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

/// Failure of a single `parse` call on a type descriptor.
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum TypeError {
    /// The value cannot be coerced to the declared type.
    #[error("cannot convert {value} to {type_name}: {reason}")]
    Conversion {
        type_name: String,
        value: Value,
        reason: String,
    },

    /// The textual encoding is structurally invalid (e.g. an empty list literal).
    #[error("malformed {type_name} literal {input:?}: {reason}")]
    Malformed {
        type_name: String,
        input: String,
        reason: String,
    },

    /// An expression type failed to evaluate. Never swallowed by `Union`.
    #[error("expression `{expr}` failed: {reason}")]
    Expression { expr: String, reason: String },
}

impl TypeError {
    pub(crate) fn conversion(
        type_name: impl Into<String>,
        value: &Value,
        reason: impl Into<String>,
    ) -> Self {
        TypeError::Conversion {
            type_name: type_name.into(),
            value: value.clone(),
            reason: reason.into(),
        }
    }

    /// True for the recoverable kind a `Union` may fall through on.
    pub fn is_conversion(&self) -> bool {
        matches!(self, TypeError::Conversion { .. })
    }
}

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum TypefigError {
    #[error("Unknown type '{0}'")]
    UnknownType(String),

    #[error("Invalid value for '{key}'{}: {source}", in_section(.section))]
    InvalidValue {
        key: String,
        section: Option<String>,
        source: TypeError,
    },

    #[error("Default for '{key}' does not match its type: {source}")]
    InvalidDefault { key: String, source: TypeError },

    #[error("Invalid schema entry '{key}': {reason}")]
    InvalidSchema { key: String, reason: String },

    #[error("Invalid guard `{callable}` on '{key}': {reason}")]
    InvalidGuard {
        key: String,
        callable: String,
        reason: String,
    },

    #[error("Guard failed for '{key}'{} (value {value}): {message}", in_section(.section))]
    GuardViolation {
        key: String,
        section: Option<String>,
        message: String,
        value: Value,
    },

    #[error("Guard '{message}' on '{key}' could not be evaluated: {source}")]
    GuardError {
        key: String,
        message: String,
        source: TypeError,
    },

    #[error("Unknown setting '{key}'{}", in_section(.section))]
    UnknownSetting {
        key: String,
        section: Option<String>,
    },

    #[error("Unknown section '{0}'")]
    UnknownSection(String),

    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in config file")]
    UnknownKeys(Vec<TypefigError>),

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No schema configured, call .schema() or .schema_file() on the builder")]
    SchemaRequired,
}

impl TypefigError {
    /// Attach a section name to value and guard failures raised without one.
    pub(crate) fn in_section(self, name: Option<&str>) -> Self {
        match self {
            TypefigError::InvalidValue { key, source, .. } => TypefigError::InvalidValue {
                key,
                section: name.map(str::to_string),
                source,
            },
            TypefigError::GuardViolation {
                key,
                message,
                value,
                ..
            } => TypefigError::GuardViolation {
                key,
                section: name.map(str::to_string),
                message,
                value,
            },
            other => other,
        }
    }
}

fn in_section(section: &Option<String>) -> String {
    match section {
        Some(name) => format!(" in section '{name}'"),
        None => String::new(),
    }
}
