//! Server module for the browser host protocol.
//!
//! This module provides:
//! - JSON-RPC 2.0 server over stdio (one message per line)
//! - Method handlers and routing
//! - Shared application state

mod handlers;
mod rpc;

pub use handlers::*;
pub use rpc::*;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::Config;
use crate::session::{SessionCoordinator, SignalDispatcher};
use crate::storage::Storage;
use crate::tabs::{HostCommandReceiver, TabRegistry};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Tab table fed by the browser host.
    pub tabs: TabRegistry,
    /// Ordered signal queue in front of the coordinator.
    pub dispatcher: SignalDispatcher,
}

impl AppState {
    /// Create application state and start the signal worker.
    ///
    /// Returns the receiver for commands that must be forwarded to the host,
    /// and the worker's join handle. Must be called inside a Tokio runtime.
    pub fn new(
        config: Config,
        storage: Arc<dyn Storage>,
    ) -> (Self, HostCommandReceiver, JoinHandle<()>) {
        let (tabs, host_commands) = TabRegistry::new();
        let coordinator =
            SessionCoordinator::new(storage, Arc::new(tabs.clone()), &config.session);
        let (dispatcher, worker) = SignalDispatcher::spawn(coordinator);

        tracing::info!(
            title_delay_ms = config.session.title_delay_ms,
            "AppState initialized"
        );

        let state = Self {
            config,
            tabs,
            dispatcher,
        };
        (state, host_commands, worker)
    }

    /// The coordinator owning the forest.
    pub fn coordinator(&self) -> &SessionCoordinator {
        self.dispatcher.coordinator()
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn test_app_state_new() {
        let (state, _rx, _worker) = AppState::new(Config::default(), Arc::new(MemoryStorage::new()));

        assert_eq!(state.config.session.title_delay_ms, 150);
        assert!(state.tabs.is_empty().await);
        assert!(state.coordinator().forest().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shared_state_type() {
        let (state, _rx, _worker) = AppState::new(Config::default(), Arc::new(MemoryStorage::new()));
        let shared: SharedState = Arc::new(state);

        let shared2 = Arc::clone(&shared);
        assert_eq!(Arc::strong_count(&shared), 2);
        drop(shared2);
        assert_eq!(Arc::strong_count(&shared), 1);
    }
}
