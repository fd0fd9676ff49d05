// src/config.rs
//! Configuration file parsing
//!
//! Supports TOML configuration files with the following sections:
//! - [server] - Bind address, CORS origins
//! - [storage] - Database path, cache root
//! - [build] - Template, compiler, timeout, concurrency
//! - [profile.<name>] - Overrides merged over the sections above
//!
//! The profile is chosen with `--profile` or the `REZEPT_ENV` variable.

use crate::build::BuildSettings;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable selecting the configuration profile
pub const PROFILE_ENV: &str = "REZEPT_ENV";

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server settings
    #[serde(default)]
    pub server: ServerSection,

    /// Storage settings
    #[serde(default)]
    pub storage: StorageSection,

    /// PDF build settings
    #[serde(default)]
    pub build: BuildSection,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// HTTP bind address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Allowed CORS origins (empty = same origin only)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

/// Storage configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Root of the PDF cache (`pdf/`, `debug/`, `build/` below it)
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_dir: default_cache_dir(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/rezept.db")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

/// Build configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// LaTeX document template
    #[serde(default = "default_template")]
    pub template: PathBuf,

    /// Compiler executable
    #[serde(default = "default_compiler")]
    pub compiler: PathBuf,

    /// Compiler timeout (e.g., "90s", "5m")
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Keep source and log of failed builds in the debug directory
    #[serde(default)]
    pub debug: bool,

    /// Maximum number of simultaneous compiler runs
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            template: default_template(),
            compiler: default_compiler(),
            timeout: default_timeout(),
            debug: false,
            max_concurrent: default_max_concurrent(),
        }
    }
}

fn default_template() -> PathBuf {
    PathBuf::from("templates/master.tex")
}

fn default_compiler() -> PathBuf {
    PathBuf::from("latexmk")
}

fn default_timeout() -> String {
    "5m".to_string()
}

fn default_max_concurrent() -> usize {
    2
}

impl AppConfig {
    /// Load configuration from a TOML file, applying `profile` if given
    pub fn load(path: &Path, profile: Option<&str>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content, profile)
            .with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    /// Parse configuration text, applying `profile` if given
    pub fn from_toml_str(content: &str, profile: Option<&str>) -> Result<Self> {
        let mut value: toml::Value = toml::from_str(content).context("Invalid TOML")?;

        let profiles = match &mut value {
            toml::Value::Table(table) => table.remove("profile"),
            _ => None,
        };

        if let Some(name) = profile {
            let overlay = profiles
                .as_ref()
                .and_then(|p| p.get(name))
                .cloned()
                .with_context(|| format!("Unknown configuration profile: {}", name))?;
            merge(&mut value, overlay);
        }

        let config: AppConfig = value.try_into().context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Profile named by the environment, if any
    pub fn profile_from_env() -> Option<String> {
        std::env::var(PROFILE_ENV).ok().filter(|p| !p.is_empty())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;
        parse_duration(&self.build.timeout)
            .with_context(|| format!("Invalid build.timeout: {}", self.build.timeout))?;

        if self.build.max_concurrent == 0 {
            anyhow::bail!("build.max_concurrent must be at least 1");
        }
        if self.build.compiler.as_os_str().is_empty() {
            anyhow::bail!("build.compiler must not be empty");
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .with_context(|| format!("Invalid server.bind address: {}", self.server.bind))
    }

    /// Build parameters for the PDF service
    pub fn build_settings(&self) -> Result<BuildSettings> {
        Ok(BuildSettings {
            template: self.build.template.clone(),
            timeout: parse_duration(&self.build.timeout)?,
            debug: self.build.debug,
            max_concurrent: self.build.max_concurrent,
        })
    }
}

/// Recursively merge `overlay` into `base`; tables merge, other values replace
fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Parse a human-readable duration string (e.g., "15m", "1h", "30s")
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix("ms") {
        return Ok(Duration::from_millis(
            n.trim()
                .parse()
                .with_context(|| format!("Invalid duration number: {}", n))?,
        ));
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 60 * 60)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Assume seconds
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid duration number: {}", num_str))?;

    Ok(Duration::from_secs(num * multiplier))
}
