//! Stations feature module
//!
//! Read-only access to the station catalogue maintained by the station sync.

pub mod queries;
pub mod routes;

pub use queries::{
    GetStationError, GetStationQuery, GetStationResponse, ListStationsError, ListStationsQuery,
};
pub use routes::stations_routes;
