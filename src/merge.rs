use serde_json::Value;

use crate::file::Document;

/// Deep-merge `overlay` on top of `base`.
/// If both sides have a table for the same key, recurse.
/// Otherwise, `overlay`'s value wins.
///
/// Section tables are merged key by key, so a later layer that sets one key
/// of a section keeps the section's other keys from earlier layers.
pub fn deep_merge(mut base: Document, overlay: Document) -> Document {
    for (key, overlay_val) in overlay {
        match (base.remove(&key), overlay_val) {
            (Some(Value::Object(base_tbl)), Value::Object(overlay_tbl)) => {
                base.insert(key, Value::Object(deep_merge(base_tbl, overlay_tbl)));
            }
            (_, overlay_val) => {
                base.insert(key, overlay_val);
            }
        }
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::parse_document;
    use std::path::Path;

    fn doc(toml_str: &str) -> Document {
        parse_document(toml_str, Path::new("t.toml")).unwrap()
    }

    #[test]
    fn disjoint_keys_merge() {
        let merged = deep_merge(doc(r#"host = "localhost""#), doc("port = 3000"));
        assert_eq!(merged["host"].as_str().unwrap(), "localhost");
        assert_eq!(merged["port"].as_i64().unwrap(), 3000);
    }

    #[test]
    fn same_scalar_key_overlay_wins() {
        let merged = deep_merge(doc("port = 8080"), doc("port = 3000"));
        assert_eq!(merged["port"].as_i64().unwrap(), 3000);
    }

    #[test]
    fn sections_merge_key_by_key() {
        let base = doc(
            r#"
            [backup]
            host = "old"
            port = 81
            "#,
        );
        let overlay = doc(
            r#"
            [backup]
            port = 90
            "#,
        );
        let merged = deep_merge(base, overlay);
        let section = merged["backup"].as_object().unwrap();
        assert_eq!(section["host"].as_str().unwrap(), "old");
        assert_eq!(section["port"].as_i64().unwrap(), 90);
    }

    #[test]
    fn overlay_scalar_replaces_table() {
        let merged = deep_merge(doc("[host]\nname = \"x\"\n"), doc(r#"host = "flat""#));
        assert_eq!(merged["host"].as_str().unwrap(), "flat");
    }

    #[test]
    fn empty_overlay_returns_base() {
        let base = doc("port = 8080");
        assert_eq!(deep_merge(base.clone(), Document::new()), base);
    }

    #[test]
    fn empty_base_returns_overlay() {
        let overlay = doc("port = 3000");
        assert_eq!(deep_merge(Document::new(), overlay.clone()), overlay);
    }

    #[test]
    fn multiple_sequential_merges() {
        let merged = deep_merge(
            deep_merge(doc(r#"host = "a""#), doc("port = 1000")),
            doc(r#"host = "c""#),
        );
        assert_eq!(merged["host"].as_str().unwrap(), "c");
        assert_eq!(merged["port"].as_i64().unwrap(), 1000);
    }
}
