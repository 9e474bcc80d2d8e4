pub mod distance;
pub mod error;
pub mod table;
pub mod types;

pub use distance::haversine_miles;
pub use error::GeoError;
pub use table::WarehouseTable;
pub use types::{Bounds, Neighbor, Resolved, TableStats, WarehouseRecord, NOT_FOUND_NOTE};
