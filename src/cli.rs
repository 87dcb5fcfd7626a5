//! Clap adapter for typefig.
//!
//! Compiled only when the `clap` Cargo feature is enabled (on by default).
//! [`ConfigArgs`] and [`ConfigSubcommand`] embed into an application's clap
//! derive to give it `config list|gen|get` subcommands.
//!
//! The only bridge to the core is [`ConfigArgs::into_action()`], which
//! converts clap-parsed arguments into a [`ConfigAction`](crate::ConfigAction)
//! for [`TypefigBuilder::handle()`](crate::TypefigBuilder::handle).

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::types::ConfigAction;

/// Clap-derived args for the `config` subcommand group.
///
/// Embed this into your app's clap derive:
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(subcommand)]
///     command: Commands,
/// }
///
/// #[derive(Subcommand)]
/// enum Commands {
///     Config(ConfigArgs),
/// }
/// ```
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Read from a named section instead of the global one.
    #[arg(long, global = true)]
    pub section: Option<String>,

    #[command(subcommand)]
    pub action: Option<ConfigSubcommand>,
}

/// Available config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show all resolved settings of a section.
    List,
    /// Generate a commented sample configuration file from the schema.
    Gen {
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the resolved value, type, and documentation of a setting.
    Get {
        /// Setting name (e.g. "port").
        key: String,
    },
}

impl ConfigArgs {
    /// Convert clap-parsed args into a framework-agnostic `ConfigAction`.
    ///
    /// Bare `config` (no subcommand) and explicit `config list` both map to
    /// `ConfigAction::List`. `--section` is ignored by `gen`.
    pub fn into_action(self) -> ConfigAction {
        let section = self.section;
        match self.action {
            None | Some(ConfigSubcommand::List) => ConfigAction::List { section },
            Some(ConfigSubcommand::Gen { output }) => ConfigAction::Gen { output },
            Some(ConfigSubcommand::Get { key }) => ConfigAction::Get { key, section },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    /// Wrapper so we can use `try_parse_from` on the subcommand.
    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    fn parse(args: &[&str]) -> ConfigArgs {
        TestCli::try_parse_from(args).unwrap().config
    }

    #[test]
    fn parse_gen_no_output() {
        let action = parse(&["test", "gen"]).into_action();
        assert_eq!(action, ConfigAction::Gen { output: None });
    }

    #[test]
    fn parse_gen_with_output() {
        let action = parse(&["test", "gen", "-o", "out.toml"]).into_action();
        assert_eq!(
            action,
            ConfigAction::Gen {
                output: Some(PathBuf::from("out.toml"))
            }
        );
    }

    #[test]
    fn parse_get() {
        let action = parse(&["test", "get", "port"]).into_action();
        assert_eq!(
            action,
            ConfigAction::Get {
                key: "port".into(),
                section: None,
            }
        );
    }

    #[test]
    fn parse_get_with_section() {
        let action = parse(&["test", "get", "port", "--section", "backup"]).into_action();
        assert_eq!(
            action,
            ConfigAction::Get {
                key: "port".into(),
                section: Some("backup".into()),
            }
        );
    }

    #[test]
    fn parse_section_before_subcommand() {
        let action = parse(&["test", "--section", "backup", "list"]).into_action();
        assert_eq!(
            action,
            ConfigAction::List {
                section: Some("backup".into()),
            }
        );
    }

    #[test]
    fn parse_bare_config_is_list() {
        let action = parse(&["test"]).into_action();
        assert_eq!(action, ConfigAction::List { section: None });
    }

    #[test]
    fn gen_ignores_section() {
        let action = parse(&["test", "gen", "--section", "backup"]).into_action();
        assert_eq!(action, ConfigAction::Gen { output: None });
    }

    #[test]
    fn removed_subcommands_error() {
        assert!(TestCli::try_parse_from(["test", "set", "port", "1"]).is_err());
        assert!(TestCli::try_parse_from(["test", "nope"]).is_err());
    }
}
