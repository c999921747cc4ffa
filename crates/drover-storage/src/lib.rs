pub mod contract;
pub mod error;
pub mod memory;
pub mod traits;

pub use error::{CatalogError, ErrorKind, StoreResult};
pub use memory::InMemoryCatalog;
pub use traits::{Catalog, PermissionIndex, ResourceCatalogStore};

/// Parse projection field names, failing with `InvalidArgument` on the first unknown one.
pub fn parse_fields<S: AsRef<str>>(names: &[S]) -> StoreResult<Vec<drover_core::ResourceField>> {
    names
        .iter()
        .map(|n| n.as_ref().parse().map_err(CatalogError::from))
        .collect()
}
