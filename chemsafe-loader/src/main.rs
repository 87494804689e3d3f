//! chemsafe - substance safety data lookup
//!
//! Subcommands:
//! - `search <term>`: resolve a substance from the store or external sources
//! - `import-statements`: load canonical hazard/precautionary statement texts

use anyhow::{Context, Result};
use chemsafe_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use chemsafe_loader::config::LoaderConfig;
use chemsafe_loader::db::SqliteStore;
use chemsafe_loader::importer::import_statements;
use chemsafe_loader::render::{render, OutputFormat};
use chemsafe_loader::sources::SourceKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "chemsafe")]
#[command(about = "Chemical substance safety data lookup")]
#[command(version)]
struct Args {
    /// Root folder holding the database
    #[arg(long, global = true, env = "CHEMSAFE_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true, env = "CHEMSAFE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a substance by name, formula, CAS number or PubChem id
    Search {
        term: String,

        /// Source to query, repeatable; order matters
        #[arg(long = "source", value_parser = parse_source_kind)]
        sources: Vec<SourceKind>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Import statement descriptions from JSON files (code → description)
    ImportStatements {
        #[arg(long, required_unless_present = "precautionary")]
        hazard: Option<PathBuf>,

        #[arg(long)]
        precautionary: Option<PathBuf>,
    },
}

fn parse_source_kind(value: &str) -> std::result::Result<SourceKind, String> {
    value.parse().map_err(|e: chemsafe_loader::LoaderError| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = TomlConfig::load_or_default(args.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&toml_config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting chemsafe v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new(args.root_folder.clone(), &toml_config).resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let pool = chemsafe_common::db::init_database(&db_path).await?;

    match args.command {
        Command::Search { term, sources, format } => {
            let config = LoaderConfig::resolve(&sources, &toml_config)?;
            let resolver = chemsafe_loader::build_resolver(pool, &config)?;
            info!("Sources: {}", resolver.source_names().join(", "));

            match resolver.resolve(&term).await? {
                Some(substance) => println!("{}", render(&substance, format)?),
                None => eprintln!("No substance found for {:?}", term),
            }
        }
        Command::ImportStatements { hazard, precautionary } => {
            let store = SqliteStore::new(pool);
            let summary = import_statements(&store, hazard.as_deref(), precautionary.as_deref()).await?;
            println!(
                "Imported statements: {} created, {} updated, {} unchanged",
                summary.created, summary.updated, summary.unchanged
            );
        }
    }

    Ok(())
}
