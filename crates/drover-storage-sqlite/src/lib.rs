mod error;
pub mod pool;
pub mod storage;

pub use pool::{ConnectionPool, PoolConfig, PooledConnection};
pub use storage::SqliteCatalog;
