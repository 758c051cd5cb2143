// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Viewer configuration.
//!
//! Supports both programmatic and file-based configuration. Command-line
//! flags of the binaries override file values.

use crate::daemon::{CommandLauncher, DaemonPool, Launcher, PoolSettings};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How to start a missing path daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Program to spawn.
    pub program: String,

    /// Arguments; `{conf_dir}`, `{addr}`, `{socket}` and `{ia}` are substituted.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Directory holding the `sd<isd>-<as>.sock` daemon sockets.
    #[serde(default = "default_socket_dir")]
    pub socket_dir: PathBuf,

    /// Root of the generated per-AS configuration tree.
    #[serde(default = "default_gen_dir")]
    pub gen_dir: PathBuf,

    /// Daemon bind address when not the per-AS loopback default.
    #[serde(default)]
    pub addr: Option<Ipv4Addr>,

    /// Start a missing daemon with `launch`.
    #[serde(default = "default_auto_launch")]
    pub auto_launch: bool,

    /// Daemon launch command. Without it a missing daemon is an error.
    #[serde(default = "default_launch")]
    pub launch: Option<LaunchConfig>,

    /// Socket polls after launching a daemon.
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,

    /// Delay between socket polls (milliseconds).
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Per-query read/write timeout (milliseconds).
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Maximum cached daemon connections.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Paths requested per query.
    #[serde(default = "default_max_paths")]
    pub max_paths: usize,
}

fn default_socket_dir() -> PathBuf {
    PathBuf::from("/run/shm/sciond")
}

fn default_gen_dir() -> PathBuf {
    PathBuf::from("gen")
}

fn default_auto_launch() -> bool {
    true
}

fn default_launch() -> Option<LaunchConfig> {
    Some(LaunchConfig {
        program: "bin/sciond".into(),
        args: ["--api-addr", "{socket}", "--addr", "{addr}", "{conf_dir}"]
            .iter()
            .map(|a| a.to_string())
            .collect(),
    })
}

fn default_connect_retries() -> u32 {
    5
}

fn default_retry_interval_ms() -> u64 {
    1000
}

fn default_query_timeout_ms() -> u64 {
    10_000
}

fn default_cache_capacity() -> usize {
    16
}

fn default_max_paths() -> usize {
    5
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            socket_dir: default_socket_dir(),
            gen_dir: default_gen_dir(),
            addr: None,
            auto_launch: default_auto_launch(),
            launch: default_launch(),
            connect_retries: default_connect_retries(),
            retry_interval_ms: default_retry_interval_ms(),
            query_timeout_ms: default_query_timeout_ms(),
            cache_capacity: default_cache_capacity(),
            max_paths: default_max_paths(),
        }
    }
}

impl ViewerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.socket_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("socket_dir is empty".into()));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid("cache_capacity must be at least 1".into()));
        }
        if self.max_paths == 0 {
            return Err(ConfigError::Invalid("max_paths must be at least 1".into()));
        }
        if self.query_timeout_ms == 0 {
            return Err(ConfigError::Invalid("query_timeout_ms must be non-zero".into()));
        }
        if let Some(launch) = &self.launch {
            if launch.program.trim().is_empty() {
                return Err(ConfigError::Invalid("launch.program is empty".into()));
            }
        }
        Ok(())
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            socket_dir: self.socket_dir.clone(),
            gen_dir: self.gen_dir.clone(),
            addr: self.addr,
            connect_retries: self.connect_retries,
            retry_interval: Duration::from_millis(self.retry_interval_ms),
            query_timeout: Duration::from_millis(self.query_timeout_ms),
            capacity: self.cache_capacity,
        }
    }

    pub fn launcher(&self) -> Option<Arc<dyn Launcher>> {
        if !self.auto_launch {
            return None;
        }
        self.launch.as_ref().map(|l| {
            Arc::new(CommandLauncher::new(l.program.clone(), l.args.clone())) as Arc<dyn Launcher>
        })
    }

    /// Connection pool configured from these settings.
    pub fn build_pool(&self) -> DaemonPool {
        DaemonPool::new(self.pool_settings(), self.launcher())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.socket_dir, PathBuf::from("/run/shm/sciond"));
        assert_eq!(config.connect_retries, 5);
        assert_eq!(config.retry_interval_ms, 1000);
        assert_eq!(config.cache_capacity, 16);
        assert!(config.validate().is_ok());
        assert!(config.auto_launch);
        assert_eq!(config.launch.as_ref().map(|l| l.program.as_str()), Some("bin/sciond"));
        assert!(config.launcher().is_some());
    }

    #[test]
    fn auto_launch_can_be_disabled() {
        let config: ViewerConfig = toml::from_str("auto_launch = false
").unwrap();
        assert!(config.launch.is_some());
        assert!(config.launcher().is_none());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: ViewerConfig = toml::from_str(
            r#"
            gen_dir = "/opt/scion/gen"
            connect_retries = 3

            [launch]
            program = "bin/sciond"
            args = ["--api-addr", "{socket}", "{conf_dir}"]
            "#,
        )
        .unwrap();
        assert_eq!(config.gen_dir, PathBuf::from("/opt/scion/gen"));
        assert_eq!(config.connect_retries, 3);
        assert_eq!(config.query_timeout_ms, 10_000);
        assert_eq!(config.launch.as_ref().unwrap().args.len(), 3);
        assert!(config.launcher().is_some());

        let settings = config.pool_settings();
        assert_eq!(settings.retry_interval, Duration::from_secs(1));
        assert_eq!(settings.capacity, 16);
    }

    #[test]
    fn validation() {
        let mut config = ViewerConfig {
            cache_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.cache_capacity = 4;
        config.launch = Some(LaunchConfig {
            program: " ".into(),
            args: Vec::new(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("asviz.toml");
        std::fs::write(&path, "max_paths = 0\n").unwrap();
        assert!(matches!(
            ViewerConfig::from_file(&path),
            Err(ConfigError::Invalid(_))
        ));

        std::fs::write(&path, "max_paths = 8\naddr = \"10.0.0.1\"\n").unwrap();
        let config = ViewerConfig::from_file(&path).unwrap();
        assert_eq!(config.max_paths, 8);
        assert_eq!(config.addr, Some(Ipv4Addr::new(10, 0, 0, 1)));
    }

    #[test]
    fn serializes_back_to_toml() {
        let toml_str = toml::to_string_pretty(&ViewerConfig::default()).unwrap();
        assert!(toml_str.contains("connect_retries = 5"));
    }
}
