pub mod get;
pub mod list;

pub use get::{GetPriceError, GetPriceQuery};
pub use list::{ListPricesError, ListPricesQuery, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
