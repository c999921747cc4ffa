use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use drover_core::{dedup_fields, Provider, ProviderSummary, ReadPermission, Resource, ResourceField, TaskId, WritePermission, TASK_PROJECTION};
use tracing::debug;

use crate::traits::{PermissionIndex, ResourceCatalogStore};
use crate::{CatalogError, StoreResult};

/// In-memory catalog for tests and dry runs. Not durable, same semantics as the SQLite backend.
#[derive(Default)]
pub struct InMemoryCatalog {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    providers: BTreeMap<String, Provider>,
    resources: Vec<Resource>,
    read_permissions: Vec<ReadPermission>,
    write_permissions: Vec<WritePermission>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| CatalogError::BackendUnavailable("in-memory catalog lock poisoned".into()))
    }
}

impl ResourceCatalogStore for InMemoryCatalog {
    fn register_provider(&self, provider: Provider) -> StoreResult<()> {
        let mut inner = self.lock()?;
        if inner.providers.contains_key(&provider.name) {
            return Err(CatalogError::ConstraintViolation(format!("provider {} already exists", provider.name)));
        }
        debug!(provider = %provider.name, "provider registered");
        inner.providers.insert(provider.name.clone(), provider);
        Ok(())
    }

    fn get_provider(&self, name: &str) -> StoreResult<Provider> {
        let inner = self.lock()?;
        inner.providers.get(name).cloned().ok_or_else(|| CatalogError::NotFound {
            entity: "provider",
            key: name.to_string(),
        })
    }

    fn list_providers(&self) -> StoreResult<Vec<ProviderSummary>> {
        let inner = self.lock()?;
        Ok(inner.providers.values().map(Provider::summary).collect())
    }

    fn record_resource(&self, resource: Resource) -> StoreResult<()> {
        let mut inner = self.lock()?;
        debug!(task_id = %resource.task_id, account = %resource.account_name, kind = %resource.kind, "resource recorded");
        inner.resources.push(resource);
        Ok(())
    }

    fn list_resources_by_task(&self, task_id: &TaskId) -> StoreResult<Vec<Resource>> {
        if task_id.is_empty() {
            return Ok(vec![]);
        }
        let inner = self.lock()?;
        Ok(inner
            .resources
            .iter()
            .filter(|r| &r.task_id == task_id)
            .map(|r| r.project(&TASK_PROJECTION))
            .collect())
    }

    fn list_resources_by_fields(&self, fields: &[ResourceField]) -> StoreResult<Vec<Resource>> {
        if fields.is_empty() {
            return Err(CatalogError::InvalidArgument("no fields provided".into()));
        }
        let fields = dedup_fields(fields);
        let inner = self.lock()?;
        let distinct: BTreeSet<Vec<&str>> = inner
            .resources
            .iter()
            .map(|r| fields.iter().map(|f| r.field(*f)).collect())
            .collect();
        Ok(distinct
            .into_iter()
            .map(|values| {
                let mut r = Resource::default();
                for (f, v) in fields.iter().zip(values) {
                    r.set_field(*f, v.to_string());
                }
                r
            })
            .collect())
    }

    fn list_accounts_by_application(&self, spinnaker_app: &str) -> StoreResult<Vec<String>> {
        let inner = self.lock()?;
        let accounts: BTreeSet<&str> = inner
            .resources
            .iter()
            .filter(|r| r.spinnaker_app == spinnaker_app)
            .map(|r| r.account_name.as_str())
            .collect();
        Ok(accounts.into_iter().map(str::to_string).collect())
    }
}

impl PermissionIndex for InMemoryCatalog {
    fn grant_read(&self, account_name: &str, group: &str) -> StoreResult<()> {
        let mut inner = self.lock()?;
        inner.read_permissions.push(ReadPermission {
            account_name: account_name.to_string(),
            read_group: group.to_string(),
        });
        debug!(account = account_name, group, "read permission granted");
        Ok(())
    }

    fn grant_write(&self, account_name: &str, group: &str) -> StoreResult<()> {
        let mut inner = self.lock()?;
        inner.write_permissions.push(WritePermission {
            account_name: account_name.to_string(),
            write_group: group.to_string(),
        });
        debug!(account = account_name, group, "write permission granted");
        Ok(())
    }

    fn list_read_groups(&self, account_name: &str) -> StoreResult<Vec<String>> {
        let inner = self.lock()?;
        let groups: BTreeSet<&str> = inner
            .read_permissions
            .iter()
            .filter(|p| p.account_name == account_name)
            .map(|p| p.read_group.as_str())
            .collect();
        Ok(groups.into_iter().map(str::to_string).collect())
    }

    fn list_write_groups(&self, account_name: &str) -> StoreResult<Vec<String>> {
        let inner = self.lock()?;
        let groups: BTreeSet<&str> = inner
            .write_permissions
            .iter()
            .filter(|p| p.account_name == account_name)
            .map(|p| p.write_group.as_str())
            .collect();
        Ok(groups.into_iter().map(str::to_string).collect())
    }
}
