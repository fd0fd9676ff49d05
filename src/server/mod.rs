// src/server/mod.rs
//! HTTP server for recipe views and PDF downloads
//!
//! Serves the HTML render model of a recipe, cached PDF builds and ad-hoc
//! preview rendering. On unix, SIGHUP reloads the configuration file; builds
//! already running finish with the services they started with.

pub mod handlers;
pub mod routes;

use crate::build::{CacheLayout, Compiler, Latexmk, PdfService};
use crate::config::AppConfig;
use crate::document::DocumentAssembler;
use crate::error::{Error, Result};
use crate::store::{RecipeStore, SqliteStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

pub use routes::create_router;

/// Shared server state
pub struct ServerState {
    pub config: Arc<AppConfig>,
    pub assembler: DocumentAssembler,
    pub pdf: Arc<PdfService>,
}

impl ServerState {
    /// Services backed by the configured database and compiler
    pub fn new(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn RecipeStore> = Arc::new(SqliteStore::new(&config.storage.db_path));
        let compiler: Arc<dyn Compiler> = Arc::new(Latexmk::new(&config.build.compiler));
        Self::with_parts(config, store, compiler)
    }

    /// Services backed by the given store and compiler
    pub fn with_parts(
        config: AppConfig,
        store: Arc<dyn RecipeStore>,
        compiler: Arc<dyn Compiler>,
    ) -> Result<Self> {
        let settings = config
            .build_settings()
            .map_err(|e| Error::ConfigError(format!("{:#}", e)))?;
        let assembler = DocumentAssembler::new(store);
        let pdf = PdfService::new(
            assembler.clone(),
            compiler,
            CacheLayout::new(&config.storage.cache_dir),
            settings,
        )?;

        Ok(Self {
            config: Arc::new(config),
            assembler,
            pdf: Arc::new(pdf),
        })
    }

    /// Swap all services for ones built from `config`
    ///
    /// Requests holding the previous `PdfService` keep using it until they
    /// complete. The bind address is not re-read.
    pub fn reload(&mut self, config: AppConfig) -> Result<()> {
        *self = Self::new(config)?;
        tracing::info!(
            "Configuration reloaded (database {:?}, cache {:?})",
            self.config.storage.db_path,
            self.config.storage.cache_dir
        );
        Ok(())
    }
}

/// Run the HTTP server until it is stopped
///
/// `config_path` and `profile` are remembered for SIGHUP reloads.
pub async fn run_server(
    config: AppConfig,
    config_path: Option<PathBuf>,
    profile: Option<String>,
) -> anyhow::Result<()> {
    let bind_addr = config.bind_addr()?;
    tracing::info!("Starting rezept server on {}", bind_addr);
    tracing::info!("Database: {:?}", config.storage.db_path);
    tracing::info!("PDF cache: {:?}", config.storage.cache_dir);
    tracing::info!(
        "Compiler: {:?} (timeout {}, max {} concurrent)",
        config.build.compiler,
        config.build.timeout,
        config.build.max_concurrent
    );

    let origins = config.server.cors_origins.clone();
    let state = Arc::new(RwLock::new(ServerState::new(config)?));

    #[cfg(unix)]
    {
        if let Some(path) = config_path {
            let reload_state = state.clone();
            tokio::spawn(async move {
                if let Err(e) = reload_on_hangup(reload_state, path, profile).await {
                    tracing::error!("Configuration reload handler stopped: {}", e);
                }
            });
        }
    }
    #[cfg(not(unix))]
    let _ = (config_path, profile);

    let app = create_router(state, &origins);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("rezept is ready to serve");

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(unix)]
async fn reload_on_hangup(
    state: Arc<RwLock<ServerState>>,
    path: PathBuf,
    profile: Option<String>,
) -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup())?;
    while hangup.recv().await.is_some() {
        tracing::info!("SIGHUP received, reloading {}", path.display());
        match AppConfig::load(&path, profile.as_deref()) {
            Ok(config) => {
                if let Err(e) = state.write().await.reload(config) {
                    tracing::error!("Reload failed, keeping previous configuration: {}", e);
                }
            }
            Err(e) => tracing::error!("Reload failed, keeping previous configuration: {:#}", e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_in(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.db_path = dir.join("rezept.db");
        config.storage.cache_dir = dir.join("cache");
        config
    }

    #[test]
    fn test_state_creates_cache_dirs() {
        let dir = tempdir().unwrap();
        let state = ServerState::new(config_in(dir.path())).unwrap();
        assert!(state.pdf.cache().pdf_dir().is_dir());
        assert!(state.pdf.cache().build_dir().is_dir());
    }

    #[test]
    fn test_reload_swaps_services() {
        let dir = tempdir().unwrap();
        let mut state = ServerState::new(config_in(dir.path())).unwrap();
        let before = Arc::clone(&state.pdf);

        let mut next = config_in(dir.path());
        next.storage.cache_dir = dir.path().join("cache2");
        next.build.debug = true;
        state.reload(next).unwrap();

        assert!(!Arc::ptr_eq(&before, &state.pdf));
        assert!(state.pdf.settings().debug);
        assert_eq!(state.pdf.cache().root(), dir.path().join("cache2"));
        // The previous service stays usable for requests that hold it
        assert_eq!(before.cache().root(), dir.path().join("cache"));
    }
}
