//! ORMKit Command-Line Client
//!
//! Loads a JSON declaration file, finalizes it and prints or exercises the
//! resulting schema.

mod commands;
mod formatter;

use clap::{Parser, Subcommand};
use commands::Direction;
use formatter::OutputFormat;
use ormkit_schema::SchemaConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// ORMKit Command-Line Client
#[derive(Parser, Debug)]
#[command(name = "ormkit")]
#[command(version, about = "Check and inspect ORMKit schema declarations")]
pub struct Args {
    /// Output format
    #[arg(long, default_value = "table", value_enum, global = true)]
    pub format: OutputFormat,

    /// Name of the synthesized primary key
    #[arg(long, global = true)]
    pub primary_key_name: Option<String>,

    /// Default storage length of string attributes
    #[arg(long, global = true)]
    pub string_length: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Finalize a declaration file and report a summary
    Check {
        /// Declaration file
        file: PathBuf,
    },
    /// Show finalized entities
    Show {
        /// Declaration file
        file: PathBuf,
        /// Only show this entity
        #[arg(short, long)]
        entity: Option<String>,
    },
    /// Run one attribute coercion function
    Coerce {
        /// Declaration file
        file: PathBuf,
        /// Entity name
        entity: String,
        /// Attribute name
        attribute: String,
        /// Coercion function to run
        #[arg(value_enum)]
        direction: Direction,
        /// Input value; omitted means undefined
        value: Option<String>,
    },
}

impl Args {
    fn config(&self) -> SchemaConfig {
        let mut config = SchemaConfig::default();
        if let Some(name) = &self.primary_key_name {
            config = config.with_primary_key_name(name.clone());
        }
        if let Some(length) = self.string_length {
            config = config.with_string_storage_length(length);
        }
        config
    }
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(default_directives(EnvFilter::from_default_env()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let formatter = formatter::create_formatter(args.format);

    match run(&args, &*formatter) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", formatter.format_error(&e.to_string()));
            std::process::exit(1);
        }
    }
}

/// `ormkit=info` also covers the `ormkit_schema` target.
fn default_directives(filter: EnvFilter) -> EnvFilter {
    filter.add_directive("ormkit=info".parse().unwrap())
}

fn run(args: &Args, formatter: &dyn formatter::Formatter) -> Result<String, commands::CliError> {
    let config = args.config();
    match &args.command {
        Command::Check { file } => {
            let schema = commands::load(file, &config)?;
            Ok(formatter.format_summary(&schema))
        }
        Command::Show { file, entity } => {
            let schema = commands::load(file, &config)?;
            let entities = commands::select(&schema, entity.as_deref())?;
            Ok(formatter.format_entities(&entities))
        }
        Command::Coerce {
            file,
            entity,
            attribute,
            direction,
            value,
        } => {
            let schema = commands::load(file, &config)?;
            let outcome = commands::coerce(&schema, entity, attribute, *direction, value.as_deref())?;
            Ok(formatter.format_outcome(&outcome))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        let filter = default_directives(EnvFilter::new("")).to_string();
        assert!(filter.contains("ormkit=info"));
        assert!(!filter.contains("ormkit_schema"));
    }

    #[test]
    fn test_config_overrides() {
        let args = Args::parse_from([
            "ormkit",
            "--primary-key-name",
            "key",
            "--string-length",
            "64",
            "check",
            "schema.json",
        ]);
        let config = args.config();
        assert_eq!(config.primary_key_name, "key");
        assert_eq!(config.string_storage_length, 64);
        assert!(matches!(args.command, Command::Check { .. }));
    }
}
