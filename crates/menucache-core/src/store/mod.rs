//! Local durable storage for the menu.
//!
//! This module provides the `LocalStore`, which keeps the most recently
//! synced menu on disk as JSON and serves sorted, filtered reads from an
//! in-memory copy.

pub mod cached;
pub mod local;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use cached::CachedData;
pub use local::LocalStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store lock poisoned by a panicked writer")]
    Poisoned,
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
