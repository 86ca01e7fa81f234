pub mod get;
pub mod list;

pub use get::{GetStationError, GetStationQuery, GetStationResponse};
pub use list::{ListStationsError, ListStationsQuery};
