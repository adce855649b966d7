//! Daemon settings
//!
//! Sources, later wins: built-in defaults, optional config file
//! (`TICKETLINE_CONFIG`, default `ticketline.toml`), environment
//! (`TICKETLINE_<SECTION>__<FIELD>`, e.g. `TICKETLINE_SERVER__PORT=9600`).

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use ticketline_api_rpc::RpcServerConfig;
use ticketline_core::application::{HubConfig, SequencerConfig, SweepConfig};

const CONFIG_PATH_ENV: &str = "TICKETLINE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "ticketline.toml";
const ENV_PREFIX: &str = "TICKETLINE";
const DEFAULT_DB_PATH: &str = "~/.ticketline/queue.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: RpcServerConfig,
    pub database: DatabaseSettings,
    pub queue: SequencerConfig,
    pub hub: HubConfig,
    pub sweep: SweepConfig,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file path (`~` is expanded) or `:memory:`
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_DB_PATH.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl DatabaseSettings {
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }

    pub fn expanded_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).into_owned())
    }

    pub fn url(&self) -> String {
        if self.is_in_memory() {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite://{}", self.expanded_path().display())
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
}

impl Settings {
    /// Load from the configured file (if present) and the environment
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::build(Some(&path), true)
    }

    fn build(path: Option<&str>, with_env: bool) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }
        if with_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }
}
