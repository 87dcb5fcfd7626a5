//! Core resolution pipeline: merge all config layers and produce validated
//! data atoms per section.
//!
//! Operates on pre-loaded data (`ResolveInput`) with no I/O, making the full
//! pipeline testable with synthetic inputs. Steps:
//!
//! 1. Decode each file and, in strict mode, check it for unknown keys
//! 2. Deep-merge files (later overrides earlier)
//! 3. Deep-merge env vars on top
//! 4. Deep-merge programmatic overrides on top (highest priority)
//! 5. Split the merged document into the global section and named sections
//! 6. Seed every section with the schema defaults, then validate and apply
//!    the keys that section sets explicitly
//!
//! Named sections start from the schema defaults, not from the global
//! section's resolved values.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Value;

use crate::env;
use crate::error::TypefigError;
use crate::file::{self, Document};
use crate::merge::deep_merge;
use crate::overrides;
use crate::schema::Schema;
use crate::validate::{self, DataAtom};

/// Settings of one section, keyed by setting name.
pub type SectionData = BTreeMap<String, DataAtom>;

/// All sections. `None` is the global section.
pub type ConfigData = BTreeMap<Option<String>, SectionData>;

/// All pre-loaded data needed to resolve a config. No I/O happens here.
pub struct ResolveInput {
    /// File contents in precedence order: first = lowest priority, last = highest.
    pub files: Vec<(PathBuf, String)>,
    /// Raw environment variable pairs (pass `std::env::vars().collect()` or synthetic data).
    pub env_vars: Vec<(String, String)>,
    /// Env var prefix (e.g. `"MYAPP"`). `None` means env disabled.
    pub env_prefix: Option<String>,
    /// Overrides as `(dotted_key, value)` pairs.
    pub overrides: Vec<(String, Value)>,
    /// Whether to reject unknown keys.
    pub strict: bool,
}

/// Resolve configuration data from pre-loaded inputs.
pub fn resolve(schema: &Schema, input: ResolveInput) -> Result<ConfigData, TypefigError> {
    let merged = merge_layers(schema, input.files, input.strict)?;
    let layers = runtime_layers(
        input.env_prefix.as_deref(),
        &input.env_vars,
        &input.overrides,
    );
    build_data(schema, deep_merge(merged, layers), input.strict)
}

/// The env layer with the overrides merged on top: everything above the
/// files. Kept by [`Configuration`](crate::Configuration) so file updates
/// can be merged beneath it again.
pub fn runtime_layers(
    env_prefix: Option<&str>,
    env_vars: &[(String, String)],
    overrides: &[(String, Value)],
) -> Document {
    let mut layers = Document::new();
    if let Some(prefix) = env_prefix {
        layers = env::env_to_document(prefix, env_vars.iter().cloned());
    }
    if !overrides.is_empty() {
        layers = deep_merge(layers, overrides::overrides_to_document(overrides));
    }
    layers
}

/// Decode, check, and deep-merge file contents in order.
pub fn merge_layers(
    schema: &Schema,
    files: Vec<(PathBuf, String)>,
    strict: bool,
) -> Result<Document, TypefigError> {
    let mut merged = Document::new();
    for (path, content) in &files {
        let doc = file::parse_document(content, path)?;
        validate::check_top_level(schema, &doc)?;
        if strict {
            validate::validate_unknown_keys(schema, &doc, content, path)?;
        }
        tracing::debug!(path = %path.display(), keys = doc.len(), "config file merged");
        merged = deep_merge(merged, doc);
    }
    Ok(merged)
}

/// Two-phase construction of section data from one merged raw document.
///
/// Phase one seeds the global section and every section named in `raw` with
/// the schema defaults. Phase two validates each explicitly present key and
/// overwrites the seeded atom.
pub fn build_data(
    schema: &Schema,
    raw: Document,
    strict: bool,
) -> Result<ConfigData, TypefigError> {
    let mut global = Document::new();
    let mut sections: Vec<(String, Document)> = Vec::new();

    for (key, value) in raw {
        if schema.contains(&key) {
            global.insert(key, value);
            continue;
        }
        // A top-level key is a setting or a section; lenient mode does not
        // relax that.
        match value {
            Value::Object(section) => sections.push((key, section)),
            _ => return Err(TypefigError::UnknownSetting { key, section: None }),
        }
    }

    let mut data = ConfigData::new();
    data.insert(None, seed_defaults(schema));
    for (name, _) in &sections {
        data.insert(Some(name.clone()), seed_defaults(schema));
    }

    apply(schema, &mut data, None, global, strict)?;
    for (name, section) in sections {
        apply(schema, &mut data, Some(name), section, strict)?;
    }

    tracing::debug!(sections = data.len() - 1, "configuration resolved");
    Ok(data)
}

fn seed_defaults(schema: &Schema) -> SectionData {
    schema
        .iter()
        .map(|atom| (atom.name().to_string(), validate::default_atom(atom)))
        .collect()
}

fn apply(
    schema: &Schema,
    data: &mut ConfigData,
    section: Option<String>,
    raw: Document,
    strict: bool,
) -> Result<(), TypefigError> {
    let mut validated = Vec::with_capacity(raw.len());
    for (key, value) in raw {
        let Some(atom) = schema.get(&key) else {
            if strict {
                return Err(TypefigError::UnknownSetting { key, section });
            }
            tracing::warn!(key = %key, section = ?section, "skipping unknown setting");
            continue;
        };
        let data_atom =
            validate::validate(&value, atom).map_err(|e| e.in_section(section.as_deref()))?;
        validated.push((key, data_atom));
    }
    if let Some(target) = data.get_mut(&section) {
        target.extend(validated);
    }
    Ok(())
}
