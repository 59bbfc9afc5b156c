use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{CatalogItem, StoredItem};
use crate::utils::{contains_ignore_case, CollationKey};

use super::{CachedData, StoreError};

/// Backing file name inside the store directory
const STORE_FILE: &str = "menu.json";

/// Persisted store contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    next_id: u64,
    items: Vec<StoredItem>,
}

#[derive(Debug, Default)]
struct StoreState {
    snapshot: Snapshot,
    updated_at: Option<DateTime<Utc>>,
}

/// Durable local copy of the menu.
///
/// Readers take an `Arc` of the current state and work on it without
/// holding any lock, so a commit in progress is never partially visible.
/// Commits are serialized; each one is written to a temporary file and
/// renamed over the backing file before the in-memory state is swapped.
pub struct LocalStore {
    path: Option<PathBuf>,
    state: RwLock<Arc<StoreState>>,
    writer: Mutex<()>,
}

impl LocalStore {
    /// Open (or create) a durable store in `dir`.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        let path = dir.join(STORE_FILE);

        let state = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
            let cached: CachedData<Snapshot> = serde_json::from_str(&contents)
                .map_err(|e| StoreError::Corrupt {
                    path: path.clone(),
                    source: e,
                })?;
            debug!(path = %path.display(), count = cached.data.items.len(), "Loaded local store");
            StoreState {
                snapshot: cached.data,
                updated_at: Some(cached.cached_at),
            }
        } else {
            StoreState::default()
        };

        Ok(Self {
            path: Some(path),
            state: RwLock::new(Arc::new(state)),
            writer: Mutex::new(()),
        })
    }

    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(Arc::new(StoreState::default())),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn current(&self) -> Result<Arc<StoreState>, StoreError> {
        self.state
            .read()
            .map(|guard| Arc::clone(&*guard))
            .map_err(|_| StoreError::Poisoned)
    }

    /// Apply `change` to the current snapshot and commit the result.
    fn commit<F>(&self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&Snapshot) -> Snapshot,
    {
        let _writer = self.writer.lock().map_err(|_| StoreError::Poisoned)?;

        let current = self.current()?;
        let next = change(&current.snapshot);
        let cached = CachedData::new(next);

        if let Some(ref path) = self.path {
            Self::persist(path, &cached)?;
        }

        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        *state = Arc::new(StoreState {
            snapshot: cached.data,
            updated_at: Some(cached.cached_at),
        });
        Ok(())
    }

    fn persist(path: &Path, cached: &CachedData<Snapshot>) -> Result<(), StoreError> {
        let contents = serde_json::to_vec(cached).map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            source: e,
        })?;

        let tmp = path.with_extension("json.tmp");
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)
            .map_err(|e| StoreError::io(&tmp, e))?;
        file.write_all(&contents).map_err(|e| StoreError::io(&tmp, e))?;
        file.sync_all().map_err(|e| StoreError::io(&tmp, e))?;
        drop(file);

        fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))?;
        Ok(())
    }

    fn assign_ids(next_id: &mut u64, items: Vec<CatalogItem>) -> Vec<StoredItem> {
        items
            .into_iter()
            .map(|item| {
                let id = *next_id;
                *next_id += 1;
                StoredItem { id, item }
            })
            .collect()
    }

    /// Remove every item. Clearing an empty store is not an error.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.commit(|current| Snapshot {
            next_id: current.next_id,
            items: Vec::new(),
        })?;
        debug!("Local store cleared");
        Ok(())
    }

    /// Append items as new records.
    pub fn insert_all(&self, items: Vec<CatalogItem>) -> Result<(), StoreError> {
        let count = items.len();
        self.commit(|current| {
            let mut next_id = current.next_id;
            let mut stored = current.items.clone();
            stored.extend(Self::assign_ids(&mut next_id, items));
            Snapshot {
                next_id,
                items: stored,
            }
        })?;
        debug!(count, "Inserted items into local store");
        Ok(())
    }

    /// Clear and insert as a single commit.
    ///
    /// Readers see either the old contents or `items`, never an empty store
    /// in between. On failure the old contents stay in place.
    pub fn replace_all(&self, items: Vec<CatalogItem>) -> Result<(), StoreError> {
        let count = items.len();
        self.commit(|current| {
            let mut next_id = current.next_id;
            let stored = Self::assign_ids(&mut next_id, items);
            Snapshot {
                next_id,
                items: stored,
            }
        })?;
        info!(count, "Local store replaced");
        Ok(())
    }

    /// All items, ascending by name.
    pub fn query_all(&self) -> Result<Vec<StoredItem>, StoreError> {
        let state = self.current()?;
        Ok(Self::sorted(state.snapshot.items.iter()))
    }

    /// Items whose name contains `substring` (case-insensitive), ascending by name.
    /// An empty substring matches everything.
    pub fn query_filtered(&self, substring: &str) -> Result<Vec<StoredItem>, StoreError> {
        let state = self.current()?;
        let needle = substring.to_lowercase();
        Ok(Self::sorted(
            state
                .snapshot
                .items
                .iter()
                .filter(|stored| contains_ignore_case(&stored.item.name, &needle)),
        ))
    }

    fn sorted<'a>(items: impl Iterator<Item = &'a StoredItem>) -> Vec<StoredItem> {
        let mut result: Vec<StoredItem> = items.cloned().collect();
        result.sort_by_cached_key(|stored| (CollationKey::new(&stored.item.name), stored.id));
        result
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.current()?.snapshot.items.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// When the contents were last committed; `None` if never.
    pub fn last_updated(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.current()?.updated_at)
    }

    /// "5m ago" style age of the contents, or "never".
    pub fn age_display(&self) -> Result<String, StoreError> {
        let state = self.current()?;
        Ok(match state.updated_at {
            Some(at) => CachedData { data: (), cached_at: at }.age_display(),
            None => "never".to_string(),
        })
    }

    /// Whether the contents are older than `max_age_minutes` (or were never written).
    pub fn is_stale(&self, max_age_minutes: i64) -> Result<bool, StoreError> {
        let state = self.current()?;
        Ok(match state.updated_at {
            Some(at) => CachedData { data: (), cached_at: at }.is_stale(max_age_minutes),
            None => true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(name: &str) -> CatalogItem {
        CatalogItem::new(name, format!("{} description", name), "9.99", None)
    }

    fn names(items: &[StoredItem]) -> Vec<&str> {
        items.iter().map(|i| i.name()).collect()
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = LocalStore::in_memory();
        assert!(store.is_empty().unwrap());
        assert!(store.query_all().unwrap().is_empty());
        assert_eq!(store.age_display().unwrap(), "never");
        assert!(store.is_stale(60).unwrap());
    }

    #[test]
    fn test_query_all_sorted() {
        let store = LocalStore::in_memory();
        store
            .insert_all(vec![item("Greek Salad"), item("bruschetta"), item("Lemon Dessert")])
            .unwrap();

        assert_eq!(
            names(&store.query_all().unwrap()),
            vec!["bruschetta", "Greek Salad", "Lemon Dessert"]
        );
    }

    #[test]
    fn test_query_filtered() {
        let store = LocalStore::in_memory();
        store
            .insert_all(vec![item("Greek Salad"), item("Bruschetta"), item("Grilled Fish")])
            .unwrap();

        assert_eq!(names(&store.query_filtered("GR").unwrap()), vec!["Greek Salad", "Grilled Fish"]);
        assert_eq!(names(&store.query_filtered("salad").unwrap()), vec!["Greek Salad"]);
        assert!(store.query_filtered("pasta").unwrap().is_empty());
        assert_eq!(store.query_filtered("").unwrap().len(), 3);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = LocalStore::in_memory();
        store.clear().unwrap();
        store.insert_all(vec![item("Pasta")]).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_ids_are_unique_across_commits() {
        let store = LocalStore::in_memory();
        store.insert_all(vec![item("A"), item("B")]).unwrap();
        let first: Vec<u64> = store.query_all().unwrap().iter().map(|i| i.id).collect();

        store.replace_all(vec![item("A"), item("B")]).unwrap();
        let second: Vec<u64> = store.query_all().unwrap().iter().map(|i| i.id).collect();

        assert_eq!(first, vec![0, 1]);
        assert_eq!(second, vec![2, 3]);
    }

    #[test]
    fn test_duplicate_names_kept() {
        let store = LocalStore::in_memory();
        store.insert_all(vec![item("Pasta"), item("Pasta")]).unwrap();
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LocalStore::open(dir.path()).unwrap();
            store.replace_all(vec![item("Greek Salad"), item("Bruschetta")]).unwrap();
        }

        let reopened = LocalStore::open(dir.path()).unwrap();
        assert_eq!(names(&reopened.query_all().unwrap()), vec!["Bruschetta", "Greek Salad"]);
        assert_eq!(reopened.age_display().unwrap(), "just now");

        // Ids keep counting after a restart
        reopened.insert_all(vec![item("Pasta")]).unwrap();
        let pasta = reopened.query_filtered("pasta").unwrap();
        assert_eq!(pasta[0].id, 2);
        assert!(!dir.path().join("menu.json.tmp").exists());
    }

    #[test]
    fn test_failed_commit_keeps_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store_dir = dir.path().join("store");
        let store = LocalStore::open(&store_dir).unwrap();
        store.replace_all(vec![item("Greek Salad")]).unwrap();

        // Swap the directory for a plain file so every write fails
        fs::remove_dir_all(&store_dir).unwrap();
        fs::write(&store_dir, b"not a directory").unwrap();

        let err = store.replace_all(vec![item("Bruschetta")]).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(names(&store.query_all().unwrap()), vec!["Greek Salad"]);

        assert!(store.clear().is_err());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(STORE_FILE), "{ not json").unwrap();

        let err = LocalStore::open(dir.path()).err().expect("open should fail");
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_poisoned_lock_surfaces_error() {
        let store = LocalStore::in_memory();
        store.insert_all(vec![item("Pasta")]).unwrap();

        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = store.state.write().unwrap();
                    panic!("poison the store lock");
                })
                .join();
        });

        assert!(matches!(store.query_all(), Err(StoreError::Poisoned)));
        assert!(matches!(store.query_filtered("p"), Err(StoreError::Poisoned)));
    }
}
