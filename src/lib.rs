//! Schema-driven, typed configuration with composable type descriptors and
//! namespaced sections.
//!
//! Typefig loads a schema that declares every recognised setting (its type,
//! default, documentation, and guards), then validates layered configuration
//! against it: config files, environment variables, and programmatic
//! overrides.
//!
//! ```ignore
//! let config = Typefig::builder()
//!     .schema_file("server.schema.toml")
//!     .file("server.toml")
//!     .load()?;
//!
//! let port = config.get("port", Some("backup"))?;
//! ```
//!
//! # Type descriptors
//!
//! A [`TypeDesc`] describes one value shape and knows how to coerce raw
//! input into it:
//!
//! - **`Int`**, **`Float`**, **`String`**, **`Bool`**: scalar coercions.
//!   `Int` truncates floats and parses numeric strings; `Bool` accepts only
//!   `true`/`True`/`false`/`False`.
//! - **`Optional[T]`**: `None` (or null) passes through, anything else
//!   is parsed as `T`.
//! - **`List[T]`**: a sequence, or a comma-separated string such as
//!   `"1, 2, 3"` or `"[1, 2, 3]"`, parsed element-wise.
//! - **`Union[A,B]`**: tries `A`, then `B`. Only conversion failures fall
//!   through; malformed input fails immediately.
//! - **`Expression`** and **`EnvExpression`**: a string evaluated as a jq
//!   program (the second one with `$env` bound to the process environment).
//!   Needs the `expr` feature, on by default.
//!
//! Names compose: `"Optional[List[Union[Int,String]]]"` resolves through
//! [`string_to_type`], and every descriptor prints back its canonical name.
//!
//! # Schema files
//!
//! ```toml
//! [port]
//! type = "Int"
//! default = 80
//! doc = "Port to listen on."
//! guards = [{ message = "port must be at least 80", callable = ". >= 80" }]
//! ```
//!
//! Defaults are coerced through their type when the schema loads, so a bad
//! default is caught before any configuration is read. A guard's `callable`
//! names a predicate registered with
//! [`TypefigBuilder::guard`]; anything else is compiled as a jq filter.
//!
//! # Sections
//!
//! Top-level keys of a config file belong to the global section; every TOML
//! table is a named section. Each section holds every setting of the schema:
//! sections start from the schema defaults, not from the global section, and
//! only the keys a section sets explicitly differ from the defaults.
//!
//! ```toml
//! port = 8080
//!
//! [backup]
//! nums = "2, 3, 1"
//! ```
//!
//! Here `port` is 8080 globally but 80 (the default) in `backup`.
//!
//! # Layer precedence
//!
//! ```text
//! Schema defaults       default = ...
//!        ↑ overridden by
//! Config files          .file(), later files win
//!        ↑ overridden by
//! Environment vars      PREFIX__KEY, PREFIX__SECTION__KEY
//!        ↑ overridden by
//! Overrides             .set_override("section.key", ...)
//! ```
//!
//! Every layer is sparse and merged key-by-key before validation.
//!
//! # Strict mode
//!
//! Strict mode is **on by default**. A config file key that is not in the
//! schema fails loading with the file path, key, and line number:
//!
//! ```text
//! Unknown key 'backup.typo' in server.toml (line 5)
//! ```
//!
//! With [`.strict(false)`](TypefigBuilder::strict) unknown keys inside a
//! section are logged at `warn` level and skipped. A top-level key that is
//! neither a setting nor a table is always an error.
//!
//! # Clap adapter
//!
//! The `cli` module (behind the `clap` feature) provides [`ConfigArgs`], which
//! gives an application `config list|get|gen` subcommands with a global
//! `--section` flag. [`ConfigArgs::into_action`] bridges to the clap-free
//! [`TypefigBuilder::handle`].
//!
//! # Error handling
//!
//! Fallible framework operations return [`TypefigError`]; descriptor-level
//! failures are [`TypeError`]. Errors name the setting and section involved.
//! Enable the `rich-errors` feature for `miette` diagnostics.

pub mod error;
pub mod types;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod config;
mod descriptor;
mod env;
mod expr;
mod file;
mod grammar;
mod guard;
mod merge;
mod ops;
mod overrides;
mod resolve;
mod schema;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::{Typefig, TypefigBuilder};
#[cfg(feature = "clap")]
pub use cli::{ConfigArgs, ConfigSubcommand};
pub use config::Configuration;
pub use descriptor::TypeDesc;
pub use error::{TypeError, TypefigError};
pub use grammar::{
    string_to_env_expression, string_to_expression, string_to_list, string_to_optional,
    string_to_scalar, string_to_type, string_to_union,
};
pub use guard::{Guard, GuardRegistry, Predicate};
pub use ops::ConfigResult;
pub use resolve::{ConfigData, SectionData};
pub use schema::{Schema, SchemaAtom};
pub use serde_json::Value;
pub use types::ConfigAction;
pub use validate::{DataAtom, validate};
