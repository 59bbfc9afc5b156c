use thiserror::Error;

use crate::api::ApiError;
use crate::store::StoreError;

/// Errors surfaced by sync and query operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Transport failure: timeout, DNS, refused connection, non-2xx status.
    #[error("Failed to fetch menu: {0}")]
    Fetch(#[source] ApiError),

    /// The response body was not a valid menu.
    #[error("Failed to decode menu: {0}")]
    Decode(#[source] ApiError),

    /// The local store could not complete the operation.
    #[error("Local store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Decode,
    StoreUnavailable,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Fetch => write!(f, "fetch"),
            ErrorKind::Decode => write!(f, "decode"),
            ErrorKind::StoreUnavailable => write!(f, "store unavailable"),
        }
    }
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Fetch(_) => ErrorKind::Fetch,
            CatalogError::Decode(_) => ErrorKind::Decode,
            CatalogError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
        }
    }
}

impl From<ApiError> for CatalogError {
    fn from(err: ApiError) -> Self {
        if err.is_decode() {
            CatalogError::Decode(err)
        } else {
            CatalogError::Fetch(err)
        }
    }
}
