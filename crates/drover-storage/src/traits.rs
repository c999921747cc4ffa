use drover_core::{Provider, ProviderSummary, Resource, ResourceField, TaskId};

use crate::StoreResult;

/// Provider and deployed-resource records. Every list call is a fixed, named projection.
pub trait ResourceCatalogStore: Send + Sync {
    /// Fails with `ConstraintViolation` when a provider with the same name exists.
    fn register_provider(&self, provider: Provider) -> StoreResult<()>;

    /// Privileged lookup including the bearer token. `NotFound` when absent.
    fn get_provider(&self, name: &str) -> StoreResult<Provider>;

    /// Name, host and CA data only.
    fn list_providers(&self) -> StoreResult<Vec<ProviderSummary>>;

    /// Append one resource row. Duplicates are accepted.
    fn record_resource(&self, resource: Resource) -> StoreResult<()>;

    /// Resources created under `task_id`, projected to account, api group, kind, name,
    /// namespace, body and version.
    fn list_resources_by_task(&self, task_id: &TaskId) -> StoreResult<Vec<Resource>>;

    /// Distinct combinations of `fields` across all resources. `InvalidArgument` when `fields` is empty.
    fn list_resources_by_fields(&self, fields: &[ResourceField]) -> StoreResult<Vec<Resource>>;

    /// Distinct account names among resources tagged with `spinnaker_app`.
    fn list_accounts_by_application(&self, spinnaker_app: &str) -> StoreResult<Vec<String>>;
}

/// Read and write group assignments per account. An account without rows grants nothing.
pub trait PermissionIndex: Send + Sync {
    fn grant_read(&self, account_name: &str, group: &str) -> StoreResult<()>;
    fn grant_write(&self, account_name: &str, group: &str) -> StoreResult<()>;

    fn list_read_groups(&self, account_name: &str) -> StoreResult<Vec<String>>;
    fn list_write_groups(&self, account_name: &str) -> StoreResult<Vec<String>>;
}

/// The single capability set the orchestration layer depends on.
pub trait Catalog: ResourceCatalogStore + PermissionIndex {}

impl<T: ResourceCatalogStore + PermissionIndex + ?Sized> Catalog for T {}
