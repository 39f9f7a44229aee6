use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{resolve_title, NavigationEvent, NavigationOutcome};
use crate::config::SessionConfig;
use crate::error::{AppResult, StorageResult};
use crate::snapshot::SessionSnapshot;
use crate::storage::Storage;
use crate::tabs::TabProvider;
use crate::tree::{self, create_node, Forest, TabId};

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod coordinator_tests;

/// Owner of the persisted forest.
///
/// Every mutation is a full load, in-memory change and full save, performed
/// while holding a single write lock so concurrent handlers cannot overwrite
/// each other's updates. Readers (`snapshot`, `forest`) do not take the lock.
#[derive(Clone)]
pub struct SessionCoordinator {
    storage: Arc<dyn Storage>,
    tabs: Arc<dyn TabProvider>,
    title_delay: Duration,
    write_lock: Arc<Mutex<()>>,
}

impl SessionCoordinator {
    /// Create a coordinator over the given storage and tab host.
    pub fn new(
        storage: Arc<dyn Storage>,
        tabs: Arc<dyn TabProvider>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            storage,
            tabs,
            title_delay: config.title_delay(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// How long a committed navigation waits before its title is read.
    pub fn title_delay(&self) -> Duration {
        self.title_delay
    }

    /// Handle a committed navigation end to end: filter it, wait for the
    /// title to settle, then record it.
    pub async fn handle_committed(&self, event: NavigationEvent) -> AppResult<NavigationOutcome> {
        if !event.is_trackable() {
            debug!(tab_id = event.tab_id, url = %event.url, frame_id = event.frame_id, "Ignoring navigation");
            return Ok(NavigationOutcome::Filtered);
        }
        tokio::time::sleep(self.title_delay).await;
        self.record_navigation(&event).await
    }

    /// Resolve the tab title now and apply the navigation to the forest.
    ///
    /// A tab that can no longer be read aborts the navigation without
    /// touching the forest.
    pub async fn record_navigation(&self, event: &NavigationEvent) -> AppResult<NavigationOutcome> {
        let tab = match self.tabs.get_tab(event.tab_id).await {
            Ok(tab) => tab,
            Err(e) => {
                warn!(
                    tab_id = event.tab_id,
                    url = %event.url,
                    error = %e,
                    "Could not process tab, it may have been closed"
                );
                return Ok(NavigationOutcome::Aborted);
            }
        };

        let title = resolve_title(tab.title.as_deref(), &event.url);
        let node = create_node(&event.url, &title);
        let tab_id = event.tab_id;

        let change = self
            .update_forest(|forest| (forest.record_navigation(tab_id, node), true))
            .await?;
        let outcome = NavigationOutcome::from(change);

        debug!(tab_id, url = %event.url, title = %title, outcome = ?outcome, "Navigation recorded");
        Ok(outcome)
    }

    /// Archive the tab's tree. Returns whether there was one to archive.
    pub async fn handle_removed(&self, tab_id: TabId) -> AppResult<bool> {
        let archived = self
            .update_forest(|forest| {
                let archived = tree::archive(forest, tab_id);
                (archived, archived)
            })
            .await?;

        if archived {
            info!(tab_id, "Tab closed, tree archived");
        } else {
            debug!(tab_id, "Tab closed with no recorded navigation");
        }
        Ok(archived)
    }

    /// Replace the stored forest with the empty forest.
    pub async fn reset(&self) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        self.storage.save_forest(&Forest::new()).await?;
        info!("Session has been reset");
        Ok(())
    }

    /// Current forest, empty if nothing is stored.
    pub async fn forest(&self) -> AppResult<Forest> {
        Ok(self.storage.load_forest_or_empty().await?)
    }

    /// Read-only view for the renderer.
    pub async fn snapshot(&self, active_url: Option<&str>) -> AppResult<SessionSnapshot> {
        let forest = self.forest().await?;
        Ok(SessionSnapshot::from_forest(&forest, active_url))
    }

    /// Open `url` in a new tab. Never touches the forest.
    pub async fn open_url(&self, url: &str) -> AppResult<()> {
        self.tabs.open_tab(url).await?;
        debug!(url = %url, "Requested new tab");
        Ok(())
    }

    /// Serialized read-modify-write. `f` returns its result and whether the
    /// forest changed; unchanged forests are not written back.
    async fn update_forest<R, F>(&self, f: F) -> StorageResult<R>
    where
        F: FnOnce(&mut Forest) -> (R, bool),
    {
        let _guard = self.write_lock.lock().await;
        let mut forest = self.storage.load_forest_or_empty().await?;
        let (result, changed) = f(&mut forest);
        if changed {
            self.storage.save_forest(&forest).await?;
        }
        Ok(result)
    }
}
