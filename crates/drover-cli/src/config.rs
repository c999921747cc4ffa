use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use drover_storage_sqlite::PoolConfig;
use tracing::debug;

const DEFAULT_DB_PATH: &str = "drover.db";
pub(crate) const DB_PATH_ENV: &str = "DROVER_DB_PATH";

/// Serialises tests that touch process environment.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
    pub conn_max_lifetime_secs: u64,
    pub conn_max_idle_secs: u64,
    pub connect_timeout_secs: u64,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let pool = PoolConfig::default();
        Self {
            path: "~/.drover/drover.db".to_string(),
            max_open_conns: pool.max_open,
            max_idle_conns: pool.max_idle,
            conn_max_lifetime_secs: pool.max_lifetime.as_secs(),
            conn_max_idle_secs: pool.idle_timeout.as_secs(),
            connect_timeout_secs: pool.connection_timeout.as_secs(),
            busy_timeout_ms: pool.busy_timeout.as_millis() as u64,
        }
    }
}

impl Config {
    /// Load from `path`, or defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn apply_env(&mut self) {
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            debug!(path = %path, "database path taken from {}", DB_PATH_ENV);
            self.database.path = path;
        }
    }
}

impl DatabaseConfig {
    /// Resolved database file. An empty path falls back to a local `drover.db`.
    pub fn db_path(&self) -> PathBuf {
        if self.path.trim().is_empty() {
            tracing::warn!("database path missing - defaulting to local sqlite db {}", DEFAULT_DB_PATH);
            return PathBuf::from(DEFAULT_DB_PATH);
        }
        PathBuf::from(shellexpand::tilde(&self.path).to_string())
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_open: self.max_open_conns,
            max_idle: self.max_idle_conns,
            max_lifetime: Duration::from_secs(self.conn_max_lifetime_secs),
            idle_timeout: Duration::from_secs(self.conn_max_idle_secs),
            connection_timeout: Duration::from_secs(self.connect_timeout_secs),
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}
