//! Application wiring for the menucache CLI.
//!
//! `App` owns the configuration, the local store and the services built on
//! it, and implements each subcommand.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use menucache_core::profile::{JsonSettingsStore, UserProfile};
use menucache_core::{
    CatalogEvent, Config, LocalStore, MenuClient, QueryService, RetryPolicy, SyncCoordinator,
    SyncOutcome,
};

use crate::render;

pub struct App {
    config: Config,
    store: Arc<LocalStore>,
    coordinator: Arc<SyncCoordinator<MenuClient>>,
    query: QueryService,
    profile: UserProfile,
}

impl App {
    pub fn new() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        let cache_dir = config.cache_dir()?;

        let store = Arc::new(
            LocalStore::open(&cache_dir)
                .with_context(|| format!("Failed to open menu cache in {}", cache_dir.display()))?,
        );
        let client = MenuClient::from_config(&config).context("Failed to create HTTP client")?;
        let coordinator = Arc::new(
            SyncCoordinator::new(client, Arc::clone(&store))
                .with_retry_policy(RetryPolicy::from_config(&config)),
        );
        let query = QueryService::new(Arc::clone(&store));
        let settings = JsonSettingsStore::open(&cache_dir)?;
        let profile = UserProfile::new(Arc::new(settings));

        Ok(Self {
            config,
            store,
            coordinator,
            query,
            profile,
        })
    }

    pub async fn sync(&self, if_stale: bool) -> Result<()> {
        let outcome = if if_stale {
            self.coordinator.sync_if_stale(self.config.stale_after_minutes).await
        } else {
            self.coordinator.sync().await
        };

        match outcome {
            Ok(SyncOutcome::Replaced { count }) => println!("Synced {} dishes.", count),
            Ok(SyncOutcome::Fresh) => println!("Menu is up to date ({}).", self.store.age_display()?),
            Ok(SyncOutcome::Superseded) => println!("Sync was superseded by a newer one."),
            Err(e) => {
                render::print_sync_error(&e, self.store.len().unwrap_or(0));
                return Err(e.into());
            }
        }
        Ok(())
    }

    pub fn search(&self, term: &str) -> Result<()> {
        let items = self.query.search(term).context("Could not read the local menu")?;
        if items.is_empty() && self.store.last_updated()?.is_none() {
            println!("No menu cached yet. Run `menucache sync` first.");
            return Ok(());
        }
        render::print_items(&items, term);
        Ok(())
    }

    /// Show cached results right away, then refresh in the background and
    /// show the results again once the new menu is in.
    pub async fn search_and_refresh(&self, term: &str) -> Result<()> {
        let mut events = self.coordinator.subscribe();
        let handle = self.coordinator.spawn_sync();

        let cached = self.query.search(term).context("Could not read the local menu")?;
        println!("Cached menu ({}):", self.store.age_display()?);
        render::print_items(&cached, term);

        let outcome = handle.await.context("Background sync task failed")?;
        if let Err(ref e) = outcome {
            warn!(error = %e, "Background refresh failed");
        }

        while let Ok(event) = events.try_recv() {
            match event {
                CatalogEvent::Replaced { count } => {
                    info!(count, "Menu replaced, re-running search");
                    let fresh = self.query.search(term).context("Could not read the local menu")?;
                    println!();
                    println!("Updated menu:");
                    render::print_items(&fresh, term);
                }
                CatalogEvent::Failed { kind, message } => {
                    println!();
                    println!("Refresh failed ({}): {}", kind, message);
                    println!("Showing the cached menu above.");
                }
            }
        }
        Ok(())
    }

    pub fn status(&self) -> Result<()> {
        render::print_status(&render::Status {
            endpoint: &self.config.endpoint_url,
            store_path: self.store.path(),
            dishes: self.store.len()?,
            age: self.store.age_display()?,
            stale: self.store.is_stale(self.config.stale_after_minutes)?,
        });
        Ok(())
    }

    pub fn register(&self, first_name: &str, last_name: &str, email: &str) -> Result<()> {
        self.profile.register(first_name, last_name, email)?;
        println!("Welcome, {}!", self.profile.load()?.display_name());
        Ok(())
    }

    pub fn show_profile(&self) -> Result<()> {
        render::print_profile(&self.profile.load()?);
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.profile.logout()?;
        println!("Logged out.");
        Ok(())
    }
}
