//! Prices feature module
//!
//! Read-only access to the current price per station and fuel type. Rows are
//! written exclusively by the sync subsystem.

pub mod queries;
pub mod routes;
pub mod types;

pub use queries::{
    GetPriceError, GetPriceQuery, ListPricesError, ListPricesQuery, DEFAULT_LIST_LIMIT,
    MAX_LIST_LIMIT,
};
pub use routes::prices_routes;
pub use types::{format_minor_units, PriceItem};
