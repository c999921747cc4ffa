use std::path::Path;
use std::time::Duration;

use drover_storage::{CatalogError, StoreResult};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

pub type ConnectionPool = r2d2::Pool<SqliteConnectionManager>;
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Pool bounds. Defaults: 5 open connections, 1 kept idle, 30s lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool
    pub max_open: u32,
    /// Connections kept open while idle
    pub max_idle: u32,
    /// Maximum connection lifetime
    pub max_lifetime: Duration,
    /// Surplus idle connections are closed after this long
    pub idle_timeout: Duration,
    /// How long a checkout waits for a free connection
    pub connection_timeout: Duration,
    /// SQLite busy handler timeout per connection
    pub busy_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_open: 5,
            max_idle: 1,
            max_lifetime: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

// r2d2 rejects zero durations; zero means "no limit" here.
fn non_zero(d: Duration) -> Option<Duration> {
    (!d.is_zero()).then_some(d)
}

pub(crate) fn unavailable(err: r2d2::Error) -> CatalogError {
    CatalogError::BackendUnavailable(err.to_string())
}

impl PoolConfig {
    fn manager(&self, path: &Path) -> SqliteConnectionManager {
        let busy_timeout = self.busy_timeout;
        SqliteConnectionManager::file(path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
            conn.execute_batch("PRAGMA foreign_keys=ON;")
        })
    }

    /// Build a pool for the database at `path`. Opens the idle connections up front, so a
    /// database that cannot be opened fails here as `BackendUnavailable`.
    pub fn build(&self, path: &Path) -> StoreResult<ConnectionPool> {
        let max_open = self.max_open.max(1);
        let pool = r2d2::Pool::builder()
            .max_size(max_open)
            .min_idle(Some(self.max_idle.min(max_open)))
            .max_lifetime(non_zero(self.max_lifetime))
            .idle_timeout(non_zero(self.idle_timeout))
            .connection_timeout(non_zero(self.connection_timeout).unwrap_or(Duration::from_millis(1)))
            .build(self.manager(path))
            .map_err(unavailable)?;
        info!(path = %path.display(), max_open, max_idle = self.max_idle, "sqlite pool ready");
        Ok(pool)
    }
}
