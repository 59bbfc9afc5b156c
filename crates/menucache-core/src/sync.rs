//! Menu synchronization.
//!
//! The `SyncCoordinator` replaces the local store with the latest remote
//! snapshot. A failed fetch or decode never touches the store, so a menu
//! that was synced once stays visible through network trouble.
//!
//! Syncs may overlap. Each one takes a generation number when it starts;
//! once its fetch completes it only replaces the store if no newer sync
//! has started in the meantime. Replacements are serialized behind a
//! writer lock, so two syncs never interleave their writes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, MenuSource};
use crate::config::Config;
use crate::error::{CatalogError, ErrorKind};
use crate::models::CatalogItem;
use crate::store::LocalStore;

/// Buffer size for the catalog event channel.
/// Slow subscribers only need the latest event, so a small buffer is enough.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Retry policy for transient fetch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: config.retry_backoff(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Notifications published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    /// The store now holds a new snapshot; re-run any open query.
    Replaced { count: usize },
    /// A sync failed; the store still holds the previous snapshot.
    Failed { kind: ErrorKind, message: String },
}

/// What a successful `sync` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The store was replaced with `count` items.
    Replaced { count: usize },
    /// A newer sync started while this one was fetching; its result was dropped.
    Superseded,
    /// The store was fresh enough that no fetch was made.
    Fresh,
}

pub struct SyncCoordinator<S> {
    source: S,
    store: Arc<LocalStore>,
    policy: RetryPolicy,
    generation: AtomicU64,
    writer: Mutex<()>,
    events: broadcast::Sender<CatalogEvent>,
}

impl<S: MenuSource> SyncCoordinator<S> {
    pub fn new(source: S, store: Arc<LocalStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            source,
            store,
            policy: RetryPolicy::default(),
            generation: AtomicU64::new(0),
            writer: Mutex::new(()),
            events,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    /// Receive an event after every completed or failed sync.
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    /// Replace the local store with the latest remote snapshot.
    pub async fn sync(&self) -> Result<SyncOutcome, CatalogError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(generation, endpoint = %self.source.endpoint(), "Starting menu sync");

        let items = match self.fetch_with_retry().await {
            Ok(items) => items,
            Err(e) => {
                let err = CatalogError::from(e);
                error!(generation, error = %err, "Menu sync failed, keeping local menu");
                self.publish_failure(&err);
                return Err(err);
            }
        };

        let _writer = self.writer.lock().await;

        let latest = self.generation.load(Ordering::SeqCst);
        if latest != generation {
            info!(generation, latest, "Menu sync superseded, dropping snapshot");
            return Ok(SyncOutcome::Superseded);
        }

        let count = items.len();
        if let Err(e) = self.store.replace_all(items) {
            let err = CatalogError::from(e);
            error!(generation, error = %err, "Failed to store menu snapshot");
            self.publish_failure(&err);
            return Err(err);
        }

        info!(generation, count, "Menu sync complete");
        self.publish(CatalogEvent::Replaced { count });
        Ok(SyncOutcome::Replaced { count })
    }

    /// Sync only when the local menu is older than `max_age_minutes`.
    pub async fn sync_if_stale(&self, max_age_minutes: i64) -> Result<SyncOutcome, CatalogError> {
        if !self.store.is_stale(max_age_minutes)? {
            debug!(max_age_minutes, "Local menu is fresh, skipping sync");
            return Ok(SyncOutcome::Fresh);
        }
        self.sync().await
    }

    async fn fetch_with_retry(&self) -> Result<Vec<CatalogItem>, ApiError> {
        let mut attempt = 0;
        let mut backoff = self.policy.initial_backoff;

        loop {
            match self.source.fetch_snapshot().await {
                Ok(items) => return Ok(items),
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    warn!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Menu fetch failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2; // Exponential backoff
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn publish_failure(&self, err: &CatalogError) {
        self.publish(CatalogEvent::Failed {
            kind: err.kind(),
            message: err.to_string(),
        });
    }

    fn publish(&self, event: CatalogEvent) {
        // No subscribers is fine; results are also returned to the caller
        if self.events.send(event).is_err() {
            debug!("No catalog subscribers");
        }
    }
}

impl<S: MenuSource + 'static> SyncCoordinator<S> {
    /// Run a sync on the tokio runtime without blocking the caller.
    pub fn spawn_sync(self: &Arc<Self>) -> JoinHandle<Result<SyncOutcome, CatalogError>> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.sync().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use tokio::sync::Notify;

    use crate::query::QueryService;

    enum Step {
        Items(Vec<CatalogItem>),
        Status(u16),
        BadPayload,
    }

    /// Replays a fixed script of fetch results.
    struct ScriptedSource {
        steps: StdMutex<VecDeque<Step>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: StdMutex::new(steps.into()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MenuSource for ScriptedSource {
        fn endpoint(&self) -> &str {
            "scripted"
        }

        async fn fetch_snapshot(&self) -> Result<Vec<CatalogItem>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self.steps.lock().unwrap().pop_front().expect("script exhausted");
            match step {
                Step::Items(items) => Ok(items),
                Step::Status(code) => Err(ApiError::from_status(StatusCode::from_u16(code).unwrap(), "")),
                Step::BadPayload => Err(serde_json::from_str::<Vec<u8>>("{").unwrap_err().into()),
            }
        }
    }

    fn dish(name: &str) -> CatalogItem {
        CatalogItem::new(name, "", "10.00", None)
    }

    fn coordinator(steps: Vec<Step>) -> SyncCoordinator<ScriptedSource> {
        SyncCoordinator::new(ScriptedSource::new(steps), Arc::new(LocalStore::in_memory()))
            .with_retry_policy(RetryPolicy {
                max_retries: 2,
                initial_backoff: Duration::from_millis(1),
            })
    }

    fn names(store: &LocalStore) -> Vec<String> {
        store.query_all().unwrap().into_iter().map(|i| i.item.name).collect()
    }

    #[tokio::test]
    async fn test_sync_replaces_store() {
        let sync = coordinator(vec![Step::Items(vec![dish("Greek Salad"), dish("Bruschetta")])]);

        let outcome = sync.sync().await.unwrap();

        assert_eq!(outcome, SyncOutcome::Replaced { count: 2 });
        assert_eq!(names(sync.store()), vec!["Bruschetta", "Greek Salad"]);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_menu() {
        let sync = coordinator(vec![
            Step::Items(vec![dish("Pasta")]),
            Step::Status(404),
        ]);
        sync.sync().await.unwrap();

        let err = sync.sync().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert_eq!(names(sync.store()), vec!["Pasta"]);
    }

    #[tokio::test]
    async fn test_decode_error_not_retried() {
        let sync = coordinator(vec![Step::BadPayload]);

        let err = sync.sync().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(sync.source.calls.load(Ordering::SeqCst), 1);
        assert!(sync.store().is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_transient_errors_retried() {
        let sync = coordinator(vec![
            Step::Status(503),
            Step::Status(429),
            Step::Items(vec![dish("Lemon Dessert")]),
        ]);

        assert_eq!(sync.sync().await.unwrap(), SyncOutcome::Replaced { count: 1 });
        assert_eq!(sync.source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let sync = coordinator(vec![Step::Status(500), Step::Status(500), Step::Status(500)]);

        let err = sync.sync().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert_eq!(sync.source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_events_published() {
        let sync = coordinator(vec![Step::Items(vec![dish("Pasta")]), Step::BadPayload]);
        let mut events = sync.subscribe();

        sync.sync().await.unwrap();
        assert_eq!(events.recv().await.unwrap(), CatalogEvent::Replaced { count: 1 });

        sync.sync().await.unwrap_err();
        match events.recv().await.unwrap() {
            CatalogEvent::Failed { kind, .. } => assert_eq!(kind, ErrorKind::Decode),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sync_if_stale_skips_fresh_store() {
        let sync = coordinator(vec![Step::Items(vec![dish("Pasta")])]);

        // Never synced, so stale
        assert_eq!(sync.sync_if_stale(60).await.unwrap(), SyncOutcome::Replaced { count: 1 });
        // Script is now empty; a second fetch would panic
        assert_eq!(sync.sync_if_stale(60).await.unwrap(), SyncOutcome::Fresh);
    }

    #[tokio::test]
    async fn test_idempotent_sync() {
        let menu = vec![dish("Greek Salad"), dish("Bruschetta"), dish("Grilled Fish")];
        let sync = coordinator(vec![Step::Items(menu.clone()), Step::Items(menu)]);
        let query = QueryService::new(Arc::clone(sync.store()));

        sync.sync().await.unwrap();
        let first: Vec<CatalogItem> = query.search("").unwrap().into_iter().map(|i| i.item).collect();
        sync.sync().await.unwrap();
        let second: Vec<CatalogItem> = query.search("").unwrap().into_iter().map(|i| i.item).collect();

        assert_eq!(first, second);
    }

    /// First fetch blocks until released; later fetches return immediately.
    struct GatedSource {
        calls: AtomicUsize,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl MenuSource for GatedSource {
        fn endpoint(&self) -> &str {
            "gated"
        }

        async fn fetch_snapshot(&self) -> Result<Vec<CatalogItem>, ApiError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.entered.notify_one();
                self.release.notified().await;
                Ok(vec![dish("Old Special")])
            } else {
                Ok(vec![dish("New Special")])
            }
        }
    }

    #[tokio::test]
    async fn test_newer_sync_supersedes_in_flight_one() {
        let source = GatedSource {
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
        };
        let sync = Arc::new(SyncCoordinator::new(source, Arc::new(LocalStore::in_memory())));

        let first = sync.spawn_sync();
        sync.source.entered.notified().await;

        assert_eq!(sync.sync().await.unwrap(), SyncOutcome::Replaced { count: 1 });

        sync.source.release.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), SyncOutcome::Superseded);
        assert_eq!(names(sync.store()), vec!["New Special"]);
    }
}
