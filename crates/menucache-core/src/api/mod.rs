//! Remote menu fetching.
//!
//! This module provides the `MenuClient` for downloading the full menu
//! snapshot from the configured endpoint, and the `MenuSource` trait the
//! sync coordinator fetches through.

pub mod client;
pub mod error;

pub use client::{MenuClient, MenuSource, DEFAULT_TIMEOUT_SECS};
pub use error::ApiError;
