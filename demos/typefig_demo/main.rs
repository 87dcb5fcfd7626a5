//! # typefig demo application
//!
//! A sample CLI tool showing how to wire typefig into an application. It is
//! not a real app; it exists to demonstrate and manually verify typefig's
//! features.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example typefig_demo -- echo
//! cargo run --example typefig_demo -- config list
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                  | How to exercise it                                                          |
//! |--------------------------|-----------------------------------------------------------------------------|
//! | Schema defaults          | `cargo run --example typefig_demo -- echo`                                  |
//! | Config file              | `cargo run --example typefig_demo -- --file server.toml echo`               |
//! | Named section            | `cargo run --example typefig_demo -- --file server.toml echo --section backup` |
//! | Env var override         | `TYPEFIG_DEMO__PORT=9000 cargo run --example typefig_demo -- echo`          |
//! | Env var in a section     | `TYPEFIG_DEMO__BACKUP__PORT=9001 cargo run --example typefig_demo -- echo --section backup` |
//! | CLI override             | `cargo run --example typefig_demo -- --port 8443 echo`                      |
//! | Guard violation          | `cargo run --example typefig_demo -- --port 22 echo`                        |
//! | `config gen`             | `cargo run --example typefig_demo -- config gen`                            |
//! | `config get`             | `cargo run --example typefig_demo -- config get nums --section backup`      |
//! | `config list`            | `cargo run --example typefig_demo -- config list`                           |

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use typefig::{ConfigArgs, Configuration, Typefig, TypefigBuilder};

const SCHEMA: &str = r#"
[port]
type = "Int"
default = 8080
doc = "Port the server listens on."
guards = [
    { message = "port must not be privileged", callable = "unprivileged" },
    { message = "port must fit in 16 bits", callable = ". <= 65535" },
]

[host]
type = "String"
default = "localhost"
doc = "Host name to bind."

[nums]
type = "List[Int]"
default = "1, 2, 3"
doc = "Worker ids, in start order."

[timeout]
type = "Union[Float,String]"
default = 2.5
doc = "Request timeout in seconds, or \"never\"."

[backup]
type = "Optional[String]"
default = "None"
doc = "Address of the backup server, if any."

[verbose]
type = "Bool"
default = "False"
doc = "Print extra detail."
"#;

// ---------------------------------------------------------------------------
// CLI definitions
// ---------------------------------------------------------------------------

/// typefig demo: a sample CLI app for showcasing typefig integration.
#[derive(Parser, Debug)]
#[command(name = "typefig-demo")]
struct Cli {
    /// Config file to load (repeatable, later files win).
    #[arg(long, global = true)]
    file: Vec<PathBuf>,

    /// Override the global port.
    #[arg(long, global = true)]
    port: Option<i64>,

    /// Override the global host.
    #[arg(long, global = true)]
    host: Option<String>,

    /// Ignore unknown keys instead of failing.
    #[arg(long, global = true)]
    lenient: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the resolved settings of one section.
    Echo {
        /// Section to print (default: global).
        #[arg(long)]
        section: Option<String>,
    },
    /// Inspect the configuration (list, get, gen).
    Config(ConfigArgs),
}

// ---------------------------------------------------------------------------
// Builder helper
// ---------------------------------------------------------------------------

fn make_builder(cli: &Cli) -> TypefigBuilder {
    let mut builder = Typefig::builder()
        .schema_str(SCHEMA)
        .guard("unprivileged", |v| v.as_i64().is_some_and(|p| p >= 1024))
        .env_prefix("TYPEFIG_DEMO")
        .strict(!cli.lenient)
        .set_override("port", cli.port)
        .set_override("host", cli.host.clone());
    for path in &cli.file {
        builder = builder.file(path);
    }
    builder
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn echo(config: &Configuration, section: Option<&str>) -> Result<(), typefig::TypefigError> {
    let data = config.section(section)?;
    let width = data.keys().map(String::len).max().unwrap_or(0);
    if let Some(name) = section {
        println!("[{name}]");
    }
    for atom in config.schema().iter() {
        if let Some(resolved) = data.get(atom.name()) {
            println!(
                "{:<width$}  {}  ({})",
                resolved.name, resolved.value, resolved.ty
            );
        }
    }
    let others: Vec<&str> = config.sections().collect();
    if section.is_none() && !others.is_empty() {
        println!();
        println!("sections: {}", others.join(", "));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    let builder = make_builder(&cli);

    match cli.command {
        Commands::Echo { section } => {
            let config = builder.load().unwrap_or_else(|e| {
                eprintln!("Failed to load config:\n{e}");
                std::process::exit(1);
            });
            if let Err(e) = echo(&config, section.as_deref()) {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Commands::Config(args) => {
            let action = args.into_action();
            builder.handle_and_print(&action).unwrap_or_else(|e| {
                eprintln!("Config error:\n{e}");
                std::process::exit(1);
            });
        }
    }
}
