// src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rezept::build::{CacheLayout, Latexmk, PdfService};
use rezept::config::AppConfig;
use rezept::document::DocumentAssembler;
use rezept::markup::Target;
use rezept::store::SqliteStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Configuration file used when `--config` is not given
const DEFAULT_CONFIG: &str = "rezept.toml";

#[derive(Parser)]
#[command(name = "rezept")]
#[command(author, version, about = "Recipe rendering with HTML preview and cached PDF builds", long_about = None)]
struct Cli {
    /// Configuration file (default: ./rezept.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Configuration profile (default: $REZEPT_ENV)
    #[arg(short, long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and seed units and step categories
    Init {
        /// Database path (overrides storage.db_path)
        #[arg(short, long)]
        db_path: Option<PathBuf>,
    },
    /// Print the render model of a recipe as JSON
    Render {
        /// Recipe id
        id: i64,
        /// Output target: html or latex
        #[arg(short, long, default_value = "html")]
        target: Target,
    },
    /// Build (or reuse) the PDF of a recipe
    Pdf {
        /// Recipe id
        id: i64,
        /// Copy the PDF to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the HTTP server
    #[cfg(feature = "server")]
    Serve {
        /// Bind address (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,
    },
}

fn load_config(path: Option<&Path>, profile: Option<&str>) -> Result<(AppConfig, Option<PathBuf>)> {
    let path = match path {
        Some(path) => Some(path.to_path_buf()),
        None => Some(PathBuf::from(DEFAULT_CONFIG)).filter(|p| p.exists()),
    };

    match &path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Ok((AppConfig::load(path, profile)?, Some(path.clone())))
        }
        None => {
            if let Some(profile) = profile {
                anyhow::bail!("Profile '{}' requested but no configuration file found", profile);
            }
            info!("No configuration file, using defaults");
            Ok((AppConfig::default(), None))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.clone().or_else(AppConfig::profile_from_env);
    let (config, config_path) = load_config(cli.config.as_deref(), profile.as_deref())?;
    #[cfg(not(feature = "server"))]
    let _ = config_path;

    match cli.command {
        Commands::Init { db_path } => {
            let db_path = db_path.unwrap_or_else(|| config.storage.db_path.clone());
            info!("Initializing database at: {}", db_path.display());
            rezept::db::init(&db_path)
                .with_context(|| format!("Failed to initialize {}", db_path.display()))?;
            println!("Database initialized successfully at: {}", db_path.display());
            Ok(())
        }
        Commands::Render { id, target } => {
            let store = Arc::new(SqliteStore::new(&config.storage.db_path));
            let model = DocumentAssembler::new(store).assemble(id, target)?;
            println!("{}", serde_json::to_string_pretty(&model)?);
            Ok(())
        }
        Commands::Pdf { id, output } => {
            let store = Arc::new(SqliteStore::new(&config.storage.db_path));
            let service = PdfService::new(
                DocumentAssembler::new(store),
                Arc::new(Latexmk::new(&config.build.compiler)),
                CacheLayout::new(&config.storage.cache_dir),
                config.build_settings()?,
            )?;

            let artifact = service.get_pdf(id).await?;
            if artifact.rebuilt {
                info!("Built {}", artifact.path.display());
            } else {
                info!("Cached PDF is up to date");
            }

            match output {
                Some(dest) => {
                    std::fs::copy(&artifact.path, &dest)
                        .with_context(|| format!("Failed to copy PDF to {}", dest.display()))?;
                    println!("{}", dest.display());
                }
                None => println!("{}", artifact.path.display()),
            }
            Ok(())
        }
        #[cfg(feature = "server")]
        Commands::Serve { bind } => {
            let mut config = config;
            if let Some(bind) = bind {
                config.server.bind = bind;
                config.validate()?;
            }
            rezept::server::run_server(config, config_path, profile).await
        }
    }
}
