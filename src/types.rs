use std::path::PathBuf;

/// A config operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigAction {
    /// Show every resolved setting of a section (`None` = global).
    List { section: Option<String> },
    /// Render a commented template from the schema.
    Gen { output: Option<PathBuf> },
    /// Show one setting's resolved value, type, and doc.
    Get {
        key: String,
        section: Option<String>,
    },
}
