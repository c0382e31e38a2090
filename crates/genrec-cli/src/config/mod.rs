//! Configuration loading for genrec.
//! Reads genrec.toml from the current directory or the path in GENREC_CONFIG.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Fixture,
    Postgres,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_fixture_path")]
    pub fixture_path: PathBuf,
    /// PostgreSQL connection string; required for the postgres backend
    pub url: Option<String>,
}

fn default_fixture_path() -> PathBuf { PathBuf::from("./genrec-data.yaml") }

impl Default for StoreConfig {
    fn default() -> Self {
        Self { backend: StoreBackend::default(), fixture_path: default_fixture_path(), url: None }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "bool_true")]
    pub pretty: bool,
}

fn bool_true() -> bool { true }

impl Default for OutputConfig {
    fn default() -> Self {
        Self { format: OutputFormat::default(), pretty: true }
    }
}

mod tests;

const DEFAULT_CONFIG_FILE: &str = "genrec.toml";

impl Config {
    /// Load configuration from genrec.toml.
    /// An explicit path must exist; the default location may be absent,
    /// in which case built-in defaults apply.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    tracing::debug!("No {DEFAULT_CONFIG_FILE} found, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };

        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
