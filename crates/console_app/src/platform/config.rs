//! Console configuration, read from a RON file.
//!
//! Every field has a default, so a partial file or no file at all is fine.
//! A file that exists but does not parse is an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use console_core::DEFAULT_PAGE_SIZE;
use console_engine::{
    ClientSettings, EngineSettings, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_RETRIES,
    DEFAULT_TASK_INTERVAL,
};
use serde::Deserialize;
use thiserror::Error;

use super::logging::LogDestination;

pub const DEFAULT_CONFIG_PATH: &str = "console.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub base_url: String,
    pub token: Option<String>,
    /// Module searched by a bare `search` command.
    pub module: Option<String>,
    pub page_size: u32,
    pub key_field: String,
    pub auto_refresh_ms: Option<u64>,
    pub max_retries: u32,
    pub task_interval_ms: u64,
    pub task_max_attempts: u32,
    pub log_destination: LogDestination,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            base_url: client.base_url,
            token: None,
            module: None,
            page_size: DEFAULT_PAGE_SIZE,
            key_field: client.key_field,
            auto_refresh_ms: None,
            max_retries: DEFAULT_MAX_RETRIES,
            task_interval_ms: DEFAULT_TASK_INTERVAL.as_millis() as u64,
            task_max_attempts: DEFAULT_MAX_ATTEMPTS,
            log_destination: LogDestination::File,
        }
    }
}

impl ConsoleConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            token: self.token.clone().filter(|token| !token.is_empty()),
            key_field: self.key_field.clone(),
            ..ClientSettings::default()
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            auto_refresh_max_retries: self.max_retries,
            task_interval: Duration::from_millis(self.task_interval_ms),
            task_max_attempts: self.task_max_attempts,
        }
    }
}

/// Config path from the first CLI argument, if any.
pub fn config_path(mut args: impl Iterator<Item = String>) -> PathBuf {
    args.next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
