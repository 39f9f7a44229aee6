use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use super::{NavigationEvent, SessionCoordinator};
use crate::error::{AppError, AppResult};
use crate::tree::TabId;

/// A browser signal waiting to be applied.
#[derive(Debug)]
enum Signal {
    /// Apply once `ready_at` has passed, giving the title time to settle.
    Committed {
        event: NavigationEvent,
        ready_at: Instant,
    },
    Removed {
        tab_id: TabId,
    },
    Reset,
    /// Resolved once every earlier signal has been applied.
    Flush(oneshot::Sender<()>),
}

/// Ordered signal queue in front of a [`SessionCoordinator`].
///
/// Signals are applied one at a time, in the order they were received, by a
/// single worker task. A committed navigation records its deadline when it
/// is enqueued and the worker waits only for whatever part of that delay is
/// left, so back-to-back navigations in one tab keep their commit order and
/// the delay does not pile up.
#[derive(Clone)]
pub struct SignalDispatcher {
    tx: mpsc::UnboundedSender<Signal>,
    coordinator: SessionCoordinator,
}

impl SignalDispatcher {
    /// Start the worker task. It runs until every dispatcher clone is dropped.
    pub fn spawn(coordinator: SessionCoordinator) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(coordinator.clone(), rx));
        (Self { tx, coordinator }, handle)
    }

    /// The coordinator signals are applied to.
    pub fn coordinator(&self) -> &SessionCoordinator {
        &self.coordinator
    }

    /// Queue a committed navigation. Returns `false` if it was filtered out.
    pub fn navigation_committed(&self, event: NavigationEvent) -> AppResult<bool> {
        if !event.is_trackable() {
            debug!(tab_id = event.tab_id, url = %event.url, frame_id = event.frame_id, "Ignoring navigation");
            return Ok(false);
        }
        let ready_at = Instant::now() + self.coordinator.title_delay();
        self.send(Signal::Committed { event, ready_at })?;
        Ok(true)
    }

    /// Queue a tab close.
    pub fn tab_removed(&self, tab_id: TabId) -> AppResult<()> {
        self.send(Signal::Removed { tab_id })
    }

    /// Queue a reset of the whole forest.
    pub fn reset(&self) -> AppResult<()> {
        self.send(Signal::Reset)
    }

    /// Wait until every signal queued before this call has been applied.
    pub async fn flush(&self) -> AppResult<()> {
        let (done, wait) = oneshot::channel();
        self.send(Signal::Flush(done))?;
        wait.await.map_err(|_| AppError::Internal {
            message: "Signal worker stopped before flush completed".to_string(),
        })
    }

    fn send(&self, signal: Signal) -> AppResult<()> {
        self.tx.send(signal).map_err(|_| AppError::Internal {
            message: "Signal worker is not running".to_string(),
        })
    }
}

async fn run_worker(coordinator: SessionCoordinator, mut rx: mpsc::UnboundedReceiver<Signal>) {
    debug!("Signal worker started");

    while let Some(signal) = rx.recv().await {
        match signal {
            Signal::Committed { event, ready_at } => {
                tokio::time::sleep_until(ready_at).await;
                if let Err(e) = coordinator.record_navigation(&event).await {
                    error!(tab_id = event.tab_id, url = %event.url, error = %e, "Failed to record navigation");
                }
            }
            Signal::Removed { tab_id } => {
                if let Err(e) = coordinator.handle_removed(tab_id).await {
                    error!(tab_id, error = %e, "Failed to archive closed tab");
                }
            }
            Signal::Reset => {
                if let Err(e) = coordinator.reset().await {
                    error!(error = %e, "Failed to reset session");
                }
            }
            Signal::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    info!("Signal queue closed, worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::storage::MemoryStorage;
    use crate::tabs::{TabInfo, TabProvider, TabRegistry};
    use std::sync::Arc;
    use std::time::Duration;

    async fn setup() -> (SignalDispatcher, TabRegistry) {
        let (registry, _rx) = TabRegistry::new();
        let coordinator = SessionCoordinator::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(registry.clone()),
            &SessionConfig::default(),
        );
        let (dispatcher, _handle) = SignalDispatcher::spawn(coordinator);
        (dispatcher, registry)
    }

    #[tokio::test(start_paused = true)]
    async fn test_filtered_navigation_not_queued() {
        let (dispatcher, _registry) = setup().await;
        let accepted = dispatcher
            .navigation_committed(NavigationEvent::new(1, "chrome://settings/", 0))
            .unwrap();
        assert!(!accepted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigations_applied_in_commit_order() {
        let (dispatcher, registry) = setup().await;
        registry.update(1, TabInfo::new(Some("Tab"), "https://c.test/")).await;

        for url in ["https://a.test/", "https://b.test/", "https://c.test/"] {
            assert!(dispatcher
                .navigation_committed(NavigationEvent::new(1, url, 0))
                .unwrap());
        }
        dispatcher.flush().await.unwrap();

        let forest = dispatcher.coordinator().forest().await.unwrap();
        let tree = forest.active_tree(1).unwrap();
        assert_eq!(tree.root().url, "https://a.test/");
        assert_eq!(tree.root().children[0].url, "https://b.test/");
        assert_eq!(tree.root().children[0].children[0].url, "https://c.test/");
        assert_eq!(tree.last_navigated_url(), "https://c.test/");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_does_not_accumulate() {
        let (dispatcher, registry) = setup().await;
        registry.update(1, TabInfo::new(None, "https://a.test/")).await;

        let start = Instant::now();
        for url in ["https://a.test/", "https://b.test/", "https://c.test/"] {
            dispatcher
                .navigation_committed(NavigationEvent::new(1, url, 0))
                .unwrap();
        }
        dispatcher.flush().await.unwrap();

        assert!(start.elapsed() < Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_during_delay_aborts_navigation() {
        let (dispatcher, registry) = setup().await;
        registry.update(2, TabInfo::new(Some("X"), "https://x.test/")).await;

        dispatcher
            .navigation_committed(NavigationEvent::new(2, "https://x.test/", 0))
            .unwrap();
        dispatcher.flush().await.unwrap();

        dispatcher
            .navigation_committed(NavigationEvent::new(2, "https://y.test/", 0))
            .unwrap();
        registry.remove(2).await;
        dispatcher.tab_removed(2).unwrap();
        dispatcher.flush().await.unwrap();

        let forest = dispatcher.coordinator().forest().await.unwrap();
        assert!(forest.active_tree(2).is_none());
        assert_eq!(forest.closed_trees().len(), 1);
        assert_eq!(forest.closed_trees()[0].root.node_count(), 1);
        assert!(registry.get_tab(2).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_ordered_after_pending_navigation() {
        let (dispatcher, registry) = setup().await;
        registry.update(1, TabInfo::new(None, "https://a.test/")).await;

        dispatcher
            .navigation_committed(NavigationEvent::new(1, "https://a.test/", 0))
            .unwrap();
        dispatcher.reset().unwrap();
        dispatcher.flush().await.unwrap();

        let forest = dispatcher.coordinator().forest().await.unwrap();
        assert!(forest.is_empty());
    }
}
