use std::path::Path;

use drover_core::{dedup_fields, Provider, ProviderSummary, Resource, ResourceField, TaskId, TASK_PROJECTION};
use drover_storage::{CatalogError, PermissionIndex, ResourceCatalogStore, StoreResult};
use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info};

use crate::error::classify;
use crate::pool::{unavailable, ConnectionPool, PoolConfig, PooledConnection};

/// SQLite-backed catalog. Every call is a single statement on a pooled connection.
pub struct SqliteCatalog {
    pool: ConnectionPool,
}

impl SqliteCatalog {
    pub fn open(db_path: &Path, config: PoolConfig) -> StoreResult<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| CatalogError::BackendUnavailable(format!("create {}: {}", parent.display(), e)))?;
        }
        let pool = config.build(db_path)?;
        {
            let conn = pool.get().map_err(unavailable)?;
            let init_sql = include_str!("../migrations/0001_init.sql");
            conn.execute_batch(init_sql).map_err(classify)?;
        }
        info!(path = %db_path.display(), "catalog opened");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    fn conn(&self) -> StoreResult<PooledConnection> {
        self.pool.get().map_err(unavailable)
    }

    fn strings(&self, sql: &str, key: &str) -> StoreResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(classify)?;
        let rows = stmt.query_map([key], |r| r.get::<_, String>(0)).map_err(classify)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(classify)
    }
}

fn projected(row: &Row<'_>, fields: &[ResourceField]) -> rusqlite::Result<Resource> {
    let mut r = Resource::default();
    for (i, f) in fields.iter().enumerate() {
        r.set_field(*f, row.get(i)?);
    }
    Ok(r)
}

fn column_list(fields: &[ResourceField]) -> String {
    fields.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
}

impl ResourceCatalogStore for SqliteCatalog {
    fn register_provider(&self, provider: Provider) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO providers(name, host, ca_data, bearer_token) VALUES (?1, ?2, ?3, ?4)",
            params![provider.name, provider.host, provider.ca_data, provider.bearer_token],
        )
        .map_err(classify)?;
        debug!(provider = %provider.name, "provider registered");
        Ok(())
    }

    fn get_provider(&self, name: &str) -> StoreResult<Provider> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT name, host, ca_data, bearer_token FROM providers WHERE name = ?1",
                [name],
                |r| {
                    Ok(Provider {
                        name: r.get(0)?,
                        host: r.get(1)?,
                        ca_data: r.get(2)?,
                        bearer_token: r.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(classify)?;
        found.ok_or_else(|| CatalogError::NotFound {
            entity: "provider",
            key: name.to_string(),
        })
    }

    fn list_providers(&self) -> StoreResult<Vec<ProviderSummary>> {
        let conn = self.conn()?;
        // list projection never includes bearer_token
        let mut stmt = conn
            .prepare("SELECT name, host, ca_data FROM providers ORDER BY name")
            .map_err(classify)?;
        let rows = stmt
            .query_map([], |r| {
                Ok(ProviderSummary {
                    name: r.get(0)?,
                    host: r.get(1)?,
                    ca_data: r.get(2)?,
                })
            })
            .map_err(classify)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(classify)
    }

    fn record_resource(&self, resource: Resource) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO resources(account_name, spinnaker_app, task_id, api_group, kind, name, namespace, resource_body, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                resource.account_name,
                resource.spinnaker_app,
                resource.task_id.as_str(),
                resource.api_group,
                resource.kind,
                resource.name,
                resource.namespace,
                resource.resource_body,
                resource.version
            ],
        )
        .map_err(classify)?;
        debug!(task_id = %resource.task_id, account = %resource.account_name, kind = %resource.kind, "resource recorded");
        Ok(())
    }

    fn list_resources_by_task(&self, task_id: &TaskId) -> StoreResult<Vec<Resource>> {
        if task_id.is_empty() {
            return Ok(vec![]);
        }
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM resources WHERE task_id = ?1 ORDER BY id", column_list(&TASK_PROJECTION));
        let mut stmt = conn.prepare(&sql).map_err(classify)?;
        let rows = stmt
            .query_map([task_id.as_str()], |r| projected(r, &TASK_PROJECTION))
            .map_err(classify)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(classify)
    }

    fn list_resources_by_fields(&self, fields: &[ResourceField]) -> StoreResult<Vec<Resource>> {
        if fields.is_empty() {
            return Err(CatalogError::InvalidArgument("no fields provided".into()));
        }
        let fields = dedup_fields(fields);
        // column names come from ResourceField, never from caller strings
        let list = column_list(&fields);
        let sql = format!("SELECT DISTINCT {list} FROM resources ORDER BY {list}");
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql).map_err(classify)?;
        let rows = stmt
            .query_map([], |r| projected(r, &fields))
            .map_err(classify)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(classify)
    }

    fn list_accounts_by_application(&self, spinnaker_app: &str) -> StoreResult<Vec<String>> {
        self.strings(
            "SELECT DISTINCT account_name FROM resources WHERE spinnaker_app = ?1 ORDER BY account_name",
            spinnaker_app,
        )
    }
}

impl PermissionIndex for SqliteCatalog {
    fn grant_read(&self, account_name: &str, group: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO read_permissions(account_name, read_group) VALUES (?1, ?2)",
            params![account_name, group],
        )
        .map_err(classify)?;
        debug!(account = account_name, group, "read permission granted");
        Ok(())
    }

    fn grant_write(&self, account_name: &str, group: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO write_permissions(account_name, write_group) VALUES (?1, ?2)",
            params![account_name, group],
        )
        .map_err(classify)?;
        debug!(account = account_name, group, "write permission granted");
        Ok(())
    }

    fn list_read_groups(&self, account_name: &str) -> StoreResult<Vec<String>> {
        self.strings(
            "SELECT DISTINCT read_group FROM read_permissions WHERE account_name = ?1 ORDER BY read_group",
            account_name,
        )
    }

    fn list_write_groups(&self, account_name: &str) -> StoreResult<Vec<String>> {
        self.strings(
            "SELECT DISTINCT write_group FROM write_permissions WHERE account_name = ?1 ORDER BY write_group",
            account_name,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drover_storage::ErrorKind;
    use tempfile::tempdir;

    fn open(dir: &Path) -> SqliteCatalog {
        SqliteCatalog::open(&dir.join("drover.db"), PoolConfig::default()).unwrap()
    }

    #[test]
    fn sqlite_open_and_migrate() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("drover.db");
        let _ = SqliteCatalog::open(&db_path, PoolConfig::default()).unwrap();
        // schema script is idempotent
        let _ = SqliteCatalog::open(&db_path, PoolConfig::default()).unwrap();
    }

    #[test]
    fn provider_row_keeps_token_at_rest() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());
        store
            .register_provider(Provider {
                name: "cluster-a".into(),
                host: "https://10.0.0.1".into(),
                ca_data: "...".into(),
                bearer_token: "secret".into(),
            })
            .unwrap();

        let conn = store.pool().get().unwrap();
        let token: String = conn
            .query_row("SELECT bearer_token FROM providers WHERE name = 'cluster-a'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(token, "secret");
        drop(conn);

        let listed = format!("{:?}", store.list_providers().unwrap());
        assert!(!listed.contains("secret"));
    }

    #[test]
    fn empty_fields_rejected() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());
        let err = store.list_resources_by_fields(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn open_creates_missing_parent_dirs() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("state").join("nested").join("drover.db");
        let _ = SqliteCatalog::open(&db_path, PoolConfig::default()).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn parent_dir_failure_is_reported() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let err = SqliteCatalog::open(&blocker.join("sub").join("drover.db"), PoolConfig::default())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
        assert!(err.to_string().contains("blocker"), "{}", err);
    }

    #[test]
    fn grants_are_not_deduplicated_at_rest() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());
        store.grant_write("cluster-a", "ops").unwrap();
        store.grant_write("cluster-a", "ops").unwrap();

        let conn = store.pool().get().unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(1) FROM write_permissions WHERE account_name = 'cluster-a'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 2);
        drop(conn);

        assert_eq!(store.list_write_groups("cluster-a").unwrap(), vec!["ops".to_string()]);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = open(dir.path());
            store.grant_read("cluster-a", "devs").unwrap();
        }
        let store = open(dir.path());
        assert_eq!(store.list_read_groups("cluster-a").unwrap(), vec!["devs".to_string()]);
    }
}
