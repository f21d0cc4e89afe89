//! CLI configuration.
//!
//! Loaded from the first file found among:
//!
//! 1. the path passed with `--config`
//! 2. `./sqlerd.toml`
//! 3. `<config dir>/sqlerd/config.toml` (e.g. `~/.config/sqlerd/config.toml`)
//!
//! Every section and key is optional.
//!
//! ```toml
//! [output]
//! format = "mermaid"
//! color = true
//!
//! [input]
//! max_input_bytes = 1048576
//!
//! [log]
//! level = "warn"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Deserialize;
use tracing::debug;

use crate::error::{SqlerdError, SqlerdResult};

/// Name of the per-directory config file.
pub const LOCAL_CONFIG: &str = "sqlerd.toml";

/// Default input cap, 1 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 1024 * 1024;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub input: InputConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Mermaid,
            color: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Inputs larger than this are rejected before analysis.
    pub max_input_bytes: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// What the CLI prints for a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Mermaid `erDiagram` text.
    #[default]
    Mermaid,
    /// The full join graph as JSON.
    Json,
    /// Table list and raw join conditions as JSON.
    Summary,
}

impl Config {
    /// Load configuration, falling back to defaults when no file exists.
    ///
    /// An explicit path must exist; the implicit locations are optional.
    pub fn load(explicit: Option<&Path>) -> SqlerdResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        for path in Self::search_paths() {
            if path.is_file() {
                return Self::from_file(&path);
            }
        }

        debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Implicit config locations, in priority order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("sqlerd").join("config.toml"));
        }
        paths
    }

    /// Read and parse one config file.
    pub fn from_file(path: &Path) -> SqlerdResult<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content, &path.display().to_string())?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse TOML text. `origin` names the source in error messages.
    pub fn parse(content: &str, origin: &str) -> SqlerdResult<Self> {
        toml::from_str(content).map_err(|e| SqlerdError::config(origin, e.to_string()))
    }

    /// Reject inputs over the configured cap.
    pub fn check_input(&self, sql: &str) -> SqlerdResult<()> {
        let limit = self.input.max_input_bytes;
        if sql.len() > limit {
            return Err(SqlerdError::InputTooLarge {
                size: sql.len(),
                limit,
            });
        }
        Ok(())
    }
}
