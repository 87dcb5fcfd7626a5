//! Schema: the set of recognised settings, each with a type, a default, a
//! doc string, and guards.
//!
//! A schema document maps setting names to records:
//!
//! ```toml
//! [port]
//! type = "Int"
//! default = 80
//! doc = "Port to listen on."
//! guards = [{ message = "port must be at least 80", callable = ". >= 80" }]
//! ```
//!
//! Every default is coerced through its declared type while the schema is
//! built, and every guard is resolved, so a schema that loads is internally
//! consistent. Atoms are immutable afterwards.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::descriptor::TypeDesc;
use crate::error::TypefigError;
use crate::file::{self, Document};
use crate::grammar::string_to_type;
use crate::guard::{Guard, GuardRegistry};

/// One declared setting.
#[derive(Debug, Clone)]
pub struct SchemaAtom {
    name: String,
    ty: TypeDesc,
    doc: String,
    default: Value,
    guards: Vec<Guard>,
}

impl SchemaAtom {
    /// Build an atom, coercing `default` through `ty`.
    pub fn new(
        name: impl Into<String>,
        ty: TypeDesc,
        doc: impl Into<String>,
        default: &Value,
    ) -> Result<Self, TypefigError> {
        let name = name.into();
        let default = ty
            .parse(default)
            .map_err(|source| TypefigError::InvalidDefault {
                key: name.clone(),
                source,
            })?;
        Ok(Self {
            name,
            ty,
            doc: doc.into(),
            default,
            guards: Vec::new(),
        })
    }

    /// Append a guard. Guards run in the order they were added.
    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeDesc {
        &self.ty
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// The already-coerced default.
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }
}

/// Ordered collection of [`SchemaAtom`]s.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    atoms: Vec<SchemaAtom>,
    index: HashMap<String, usize>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAtom {
    default: Value,
    #[serde(rename = "type")]
    type_name: String,
    doc: String,
    #[serde(default)]
    guards: Vec<RawGuard>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGuard {
    message: String,
    callable: String,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an atom. Names must be unique.
    pub fn add(&mut self, atom: SchemaAtom) -> Result<(), TypefigError> {
        if self.index.contains_key(atom.name()) {
            return Err(TypefigError::InvalidSchema {
                key: atom.name().to_string(),
                reason: "declared more than once".into(),
            });
        }
        self.index.insert(atom.name().to_string(), self.atoms.len());
        self.atoms.push(atom);
        Ok(())
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, atom: SchemaAtom) -> Result<Self, TypefigError> {
        self.add(atom)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&SchemaAtom> {
        self.index.get(name).map(|&i| &self.atoms[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Atoms in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &SchemaAtom> {
        self.atoms.iter()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Build a schema from a decoded schema document.
    pub fn from_document(doc: Document, registry: &GuardRegistry) -> Result<Self, TypefigError> {
        let mut schema = Schema::new();
        for (name, record) in doc {
            let raw: RawAtom =
                serde_json::from_value(record).map_err(|e| TypefigError::InvalidSchema {
                    key: name.clone(),
                    reason: e.to_string(),
                })?;
            let ty = string_to_type(&raw.type_name)?;
            let mut atom = SchemaAtom::new(name.as_str(), ty, raw.doc, &raw.default)?;
            for guard in raw.guards {
                atom = atom.with_guard(registry.resolve(&name, &guard.message, &guard.callable)?);
            }
            tracing::debug!(
                setting = %name,
                ty = %atom.ty(),
                guards = atom.guards().len(),
                "schema atom loaded"
            );
            schema.add(atom)?;
        }
        Ok(schema)
    }

    /// Parse TOML schema text. `path` is only used in error messages.
    pub fn from_toml(
        content: &str,
        path: &Path,
        registry: &GuardRegistry,
    ) -> Result<Self, TypefigError> {
        Self::from_document(file::parse_document(content, path)?, registry)
    }

    pub fn from_file(path: &Path, registry: &GuardRegistry) -> Result<Self, TypefigError> {
        let content = file::read_file(path)?;
        Self::from_toml(&content, path, registry)
    }
}
