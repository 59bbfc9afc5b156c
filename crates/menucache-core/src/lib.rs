//! Local cache of the Little Lemon menu.
//!
//! Fetches the remote menu over HTTP, keeps it in a durable local store and
//! serves sorted, filtered views of it:
//!
//! - `api`: remote fetcher (`MenuClient`, `MenuSource`)
//! - `store`: durable local store (`LocalStore`)
//! - `sync`: replaces the store with remote snapshots (`SyncCoordinator`)
//! - `query`: name search over the store (`QueryService`)
//! - `profile`: user settings (`SettingsStore`, `UserProfile`)

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod profile;
pub mod query;
pub mod store;
pub mod sync;
pub mod utils;

pub use api::{ApiError, MenuClient, MenuSource};
pub use config::Config;
pub use error::{CatalogError, ErrorKind};
pub use models::{CatalogItem, StoredItem};
pub use query::QueryService;
pub use store::{LocalStore, StoreError};
pub use sync::{CatalogEvent, RetryPolicy, SyncCoordinator, SyncOutcome};
