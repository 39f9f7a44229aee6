//! Session coordination.
//!
//! This module turns browser signals into forest mutations:
//! - [`NavigationEvent`] filtering (main frame, `http`/`https` only)
//! - page title resolution with hostname fallback
//! - [`SessionCoordinator`]: the single writer of the persisted forest
//! - [`SignalDispatcher`]: the ordered signal queue in front of it

mod coordinator;
mod dispatcher;

pub use coordinator::*;
pub use dispatcher::*;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::tree::{AttachOutcome, NavigationChange, TabId};

/// A committed navigation reported by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEvent {
    /// Tab the navigation happened in.
    pub tab_id: TabId,
    /// Committed URL.
    pub url: String,
    /// Frame id; `0` is the top-level frame.
    pub frame_id: i64,
}

impl NavigationEvent {
    /// Build an event as the host would report it.
    pub fn new(tab_id: TabId, url: impl Into<String>, frame_id: i64) -> Self {
        Self {
            tab_id,
            url: url.into(),
            frame_id,
        }
    }

    /// Top-level frame navigation to an `http` or `https` URL.
    pub fn is_trackable(&self) -> bool {
        self.frame_id == 0 && is_web_url(&self.url)
    }
}

fn is_web_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Pick the display title for a node.
///
/// Uses the tab title unless it is missing, empty, or just the raw URL, in
/// which case the URL's hostname is used (or the URL itself if it has none).
pub fn resolve_title(tab_title: Option<&str>, url: &str) -> String {
    match tab_title {
        Some(title) if !title.is_empty() && title != url => title.to_string(),
        _ => hostname(url).unwrap_or_else(|| url.to_string()),
    }
}

fn hostname(raw: &str) -> Option<String> {
    Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

/// What happened to one navigation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationOutcome {
    /// First navigation in the tab; a new tree was rooted.
    Created,
    /// A new node was attached under the previous position.
    Attached,
    /// Repeated or already-recorded edge; only the cursor moved.
    Deduplicated,
    /// The cursor URL was not found in the tree; only the cursor moved.
    ParentMissing,
    /// Not a top-level web navigation; ignored.
    Filtered,
    /// The tab could not be read (usually closed meanwhile); nothing recorded.
    Aborted,
}

impl From<NavigationChange> for NavigationOutcome {
    fn from(change: NavigationChange) -> Self {
        match change {
            NavigationChange::Created => NavigationOutcome::Created,
            NavigationChange::Extended(AttachOutcome::Attached) => NavigationOutcome::Attached,
            NavigationChange::Extended(AttachOutcome::Duplicate) => NavigationOutcome::Deduplicated,
            NavigationChange::Extended(AttachOutcome::ParentNotFound) => {
                NavigationOutcome::ParentMissing
            }
        }
    }
}
