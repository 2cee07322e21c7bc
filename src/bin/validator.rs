//! Schematic Validator CLI
//!
//! Compiles a JSON schema and checks documents against it.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use schematic::loader::{collect_documents, load_document, load_schema};
use schematic::{Compiler, SchematicConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schematic-validator")]
#[command(about = "Validate JSON documents against a schematic schema")]
struct Cli {
    /// Path to the schema file (JSON)
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Configuration file, layered over the default locations
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate documents; directories are searched for *.json files
    Check {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Print the compiled property table
    Inspect {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write the default configuration
    Init {
        #[arg(default_value = "schematic.toml")]
        path: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match SchematicConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(cli, config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the command succeeded
fn run(cli: Cli, config: SchematicConfig) -> anyhow::Result<bool> {
    match cli.command {
        Commands::Check { paths } => {
            let compiler = Compiler::new(config.compiler);
            let schema_path = required_schema(cli.schema.as_deref())?;
            let schematic = load_schema(schema_path, &compiler)?;

            let documents = collect_documents(&paths);
            if documents.is_empty() {
                bail!("No JSON documents found");
            }

            println!("🔍 Checking {} document(s) against {}", documents.len(), schema_path.display());

            let mut failures = 0;
            for path in &documents {
                match load_document(path) {
                    Ok(document) if schematic.is(&document) => println!("  ✅ {}", path.display()),
                    Ok(_) => {
                        failures += 1;
                        println!("  ❌ {}", path.display());
                    }
                    Err(e) => {
                        failures += 1;
                        println!("  ⚠️  {}: {}", path.display(), e);
                    }
                }
            }

            println!();
            if failures == 0 {
                println!("✅ All documents match");
            } else {
                println!("❌ {} of {} document(s) do not match", failures, documents.len());
            }
            Ok(failures == 0)
        }

        Commands::Inspect { json } => {
            let compiler = Compiler::new(config.compiler);
            let schema_path = required_schema(cli.schema.as_deref())?;
            let schematic = load_schema(schema_path, &compiler)?;
            let summary = schematic.describe();

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(true);
            }

            if !schematic.is_enabled() {
                println!("⚠️  Schema is empty and disabled: no value will match");
                return Ok(true);
            }

            println!("📋 {} ({} properties)", schema_path.display(), summary.len());
            for property in &summary {
                let marker = if property.required { "*" } else { " " };
                println!("  {} {:<32} {}", marker, property.path, property.types.join(" | "));
                for (name, count) in &property.validators {
                    println!("      └─ {} validator(s) for {}", count, name);
                }
            }
            Ok(true)
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(true)
            }
            ConfigAction::Init { path, force } => {
                if Path::new(&path).exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path);
                }
                SchematicConfig::default()
                    .save(&path)
                    .with_context(|| format!("Failed to write {}", path))?;
                println!("✅ Wrote default configuration to {}", path);
                Ok(true)
            }
        },
    }
}

fn required_schema(schema: Option<&Path>) -> anyhow::Result<&Path> {
    schema.context("--schema is required for this command")
}
