// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: `verdict.toml` in the state directory, with
//! `VERDICT_STATE_DIR` selecting the directory itself.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use verdict_engine::ServiceConfig;

/// Errors while loading daemon configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// On-disk shape of `verdict.toml`. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    job: JobSection,
    #[serde(default)]
    runner: RunnerSection,
    #[serde(default)]
    analyzers: AnalyzersSection,
    /// user id → organisation
    #[serde(default)]
    users: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct JobSection {
    /// Similar-job cache window in seconds; 0 disables.
    #[serde(default)]
    cache: u64,
    /// Analyzer wall-clock timeout in seconds; absent means none.
    timeout: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RunnerSection {
    #[serde(default = "default_pool_size")]
    pool_size: usize,
}

fn default_pool_size() -> usize {
    4
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnalyzersSection {
    /// Directory of per-analyzer JSON definition files, relative to the
    /// state directory unless absolute.
    #[serde(default = "default_analyzers_path")]
    path: PathBuf,
}

fn default_analyzers_path() -> PathBuf {
    PathBuf::from("analyzers.d")
}

impl Default for AnalyzersSection {
    fn default() -> Self {
        Self {
            path: default_analyzers_path(),
        }
    }
}

/// Resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
    pub analyzers_dir: PathBuf,
    pub users: HashMap<String, String>,
    pub service: ServiceConfig,
}

impl Config {
    /// Load from `$VERDICT_STATE_DIR/verdict.toml` (directory defaults
    /// to `.verdict`). A missing config file yields the defaults.
    pub fn load() -> Result<Config, ConfigError> {
        let state_dir = std::env::var_os("VERDICT_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".verdict"));
        Self::load_from(&state_dir)
    }

    pub fn load_from(state_dir: &Path) -> Result<Config, ConfigError> {
        let config_path = state_dir.join("verdict.toml");
        let file: FileConfig = if config_path.exists() {
            let text = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
                path: config_path.clone(),
                source,
            })?;
            toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: config_path.clone(),
                source,
            })?
        } else {
            FileConfig::default()
        };

        let analyzers_dir = if file.analyzers.path.is_absolute() {
            file.analyzers.path.clone()
        } else {
            state_dir.join(&file.analyzers.path)
        };

        Ok(Config {
            state_dir: state_dir.to_path_buf(),
            socket_path: state_dir.join("verdictd.sock"),
            lock_path: state_dir.join("verdictd.lock"),
            log_path: state_dir.join("verdictd.log"),
            analyzers_dir,
            users: file.users,
            service: ServiceConfig {
                cache: Duration::from_secs(file.job.cache),
                timeout: file.job.timeout.map(Duration::from_secs),
                pool_size: file.runner.pool_size,
            },
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
