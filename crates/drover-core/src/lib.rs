pub mod field;
pub mod ids;
pub mod model;
pub mod workload;

pub use field::*;
pub use ids::*;
pub use model::*;
pub use workload::*;
