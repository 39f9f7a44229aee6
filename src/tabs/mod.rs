//! Tab host abstraction.
//!
//! The coordinator never talks to the browser directly. It asks a
//! [`TabProvider`] for the live state of a tab (to resolve the page title)
//! and to open new tabs. [`TabRegistry`] is the provider used by the stdio
//! server: the host pushes tab updates into it, and tab-open requests are
//! queued as [`HostCommand`]s for the server to forward.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::error::{TabError, TabResult};
use crate::tree::TabId;

/// Live state of a browser tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    /// Page title, if the browser has one yet.
    #[serde(default)]
    pub title: Option<String>,
    /// URL currently loaded in the tab.
    pub url: String,
}

impl TabInfo {
    /// Tab state from a title and URL.
    pub fn new(title: Option<&str>, url: impl Into<String>) -> Self {
        Self {
            title: title.map(str::to_string),
            url: url.into(),
        }
    }
}

/// Access to the browser's tabs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TabProvider: Send + Sync {
    /// Current state of `tab_id`. Fails with [`TabError::NotFound`] once the
    /// tab is gone.
    async fn get_tab(&self, tab_id: TabId) -> TabResult<TabInfo>;

    /// Ask the browser to open `url` in a new, focused tab.
    async fn open_tab(&self, url: &str) -> TabResult<()>;
}

/// Commands the service sends back to the browser host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum HostCommand {
    #[serde(rename = "host/openTab")]
    /// Open `url` in a new focused tab.
    OpenTab { url: String },
}

/// Receiving end of the host command queue.
pub type HostCommandReceiver = mpsc::UnboundedReceiver<HostCommand>;

/// Tab table fed by host `tabs/updated` / `tabs/removed` messages.
#[derive(Clone)]
pub struct TabRegistry {
    tabs: Arc<RwLock<HashMap<TabId, TabInfo>>>,
    commands: mpsc::UnboundedSender<HostCommand>,
}

impl TabRegistry {
    /// Create a registry and the receiving end of its host command queue.
    pub fn new() -> (Self, HostCommandReceiver) {
        let (commands, rx) = mpsc::unbounded_channel();
        let registry = Self {
            tabs: Arc::new(RwLock::new(HashMap::new())),
            commands,
        };
        (registry, rx)
    }

    /// Record the latest known state of a tab.
    pub async fn update(&self, tab_id: TabId, info: TabInfo) {
        debug!(tab_id, url = %info.url, "Tab updated");
        self.tabs.write().await.insert(tab_id, info);
    }

    /// Register a tab the host has not described yet, keeping any known state.
    /// Returns `true` if the tab was new.
    pub async fn register(&self, tab_id: TabId, url: &str) -> bool {
        match self.tabs.write().await.entry(tab_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                debug!(tab_id, url = %url, "Tab registered from navigation");
                slot.insert(TabInfo::new(None, url));
                true
            }
        }
    }

    /// Forget a closed tab.
    pub async fn remove(&self, tab_id: TabId) -> Option<TabInfo> {
        self.tabs.write().await.remove(&tab_id)
    }

    /// Number of tabs currently known.
    pub async fn len(&self) -> usize {
        self.tabs.read().await.len()
    }

    /// Whether no tabs are known.
    pub async fn is_empty(&self) -> bool {
        self.tabs.read().await.is_empty()
    }
}

#[async_trait]
impl TabProvider for TabRegistry {
    async fn get_tab(&self, tab_id: TabId) -> TabResult<TabInfo> {
        self.tabs
            .read()
            .await
            .get(&tab_id)
            .cloned()
            .ok_or(TabError::NotFound { tab_id })
    }

    async fn open_tab(&self, url: &str) -> TabResult<()> {
        self.commands
            .send(HostCommand::OpenTab {
                url: url.to_string(),
            })
            .map_err(|e| TabError::HostUnavailable {
                message: e.to_string(),
            })
    }
}
