//! Convert dotted-key programmatic overrides into a config document layer.
//!
//! `("port", 90)` targets the global section and `("backup.port", 90)`
//! targets section `backup`. The section is everything before the last dot.

use serde_json::Value;

use crate::file::Document;

/// Convert dotted-key overrides into a document.
///
/// If multiple entries target the same key, the last one wins.
pub fn overrides_to_document(entries: &[(String, Value)]) -> Document {
    let mut doc = Document::new();
    for (dotted_key, value) in entries {
        set_nested(&mut doc, dotted_key, value.clone());
    }
    doc
}

fn set_nested(doc: &mut Document, dotted_key: &str, value: Value) {
    let Some((section, key)) = dotted_key.rsplit_once('.') else {
        doc.insert(dotted_key.to_string(), value);
        return;
    };
    let entry = doc
        .entry(section.to_string())
        .or_insert_with(|| Value::Object(Document::new()));
    if !entry.is_object() {
        *entry = Value::Object(Document::new());
    }
    if let Value::Object(sub) = entry {
        sub.insert(key.to_string(), value);
    }
}
