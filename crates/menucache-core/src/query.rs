use std::sync::Arc;

use tracing::debug;

use crate::error::CatalogError;
use crate::models::StoredItem;
use crate::store::LocalStore;

/// Read-only search over the local store.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<LocalStore>,
}

impl QueryService {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    /// Items whose name contains `term` (trimmed, case-insensitive), sorted by name.
    /// A blank term returns the whole menu.
    ///
    /// A store failure is returned as an error rather than an empty list, so
    /// "nothing matches" and "could not read" stay distinguishable.
    pub fn search(&self, term: &str) -> Result<Vec<StoredItem>, CatalogError> {
        let term = term.trim();
        let items = if term.is_empty() {
            self.store.query_all()?
        } else {
            self.store.query_filtered(term)?
        };
        debug!(term, count = items.len(), "Menu search");
        Ok(items)
    }
}
