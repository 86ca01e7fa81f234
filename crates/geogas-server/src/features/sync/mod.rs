//! Sync feature module
//!
//! Administrative triggers for the upstream synchronization. Each request
//! runs one sync to completion and reports the counts; nothing is scheduled
//! in the background.

pub mod routes;


pub use routes::{sync_routes, SyncApiError, SyncState};
