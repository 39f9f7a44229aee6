use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::SharedState;
use crate::error::{ProtocolError, ProtocolResult};
use crate::session::NavigationEvent;
use crate::tabs::TabInfo;
use crate::tree::TabId;

/// Methods routed by [`handle_method`].
pub const METHODS: &[&str] = &[
    "navigation/committed",
    "tabs/updated",
    "tabs/removed",
    "session/snapshot",
    "session/reset",
    "session/openUrl",
];

/// Parameters of `tabs/updated`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabUpdatedParams {
    /// Tab that changed.
    pub tab_id: TabId,
    #[serde(default)]
    /// Current title, absent while loading.
    pub title: Option<String>,
    /// Current URL.
    pub url: String,
}

/// Parameters of `tabs/removed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabRemovedParams {
    /// Tab that closed.
    pub tab_id: TabId,
}

/// Parameters of `session/snapshot`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotParams {
    #[serde(default)]
    /// URL of the page the renderer is shown for.
    pub active_url: Option<String>,
}

/// Parameters of `session/openUrl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenUrlParams {
    /// URL to open in a new tab.
    pub url: String,
}

/// Route a host method to its handler
pub async fn handle_method(
    state: &SharedState,
    method: &str,
    params: Option<Value>,
) -> ProtocolResult<Value> {
    debug!(method = %method, "Routing method");

    match method {
        "navigation/committed" => handle_navigation_committed(state, params).await,
        "tabs/updated" => handle_tab_updated(state, params).await,
        "tabs/removed" => handle_tab_removed(state, params).await,
        "session/snapshot" => handle_snapshot(state, params).await,
        "session/reset" => handle_reset(state).await,
        "session/openUrl" => handle_open_url(state, params).await,
        _ => Err(ProtocolError::UnknownMethod {
            method: method.to_string(),
        }),
    }
}

async fn handle_navigation_committed(
    state: &SharedState,
    params: Option<Value>,
) -> ProtocolResult<Value> {
    let event: NavigationEvent = parse_params("navigation/committed", params)?;
    // A commit proves the tab is open even if `tabs/updated` hasn't arrived.
    if event.is_trackable() {
        state.tabs.register(event.tab_id, &event.url).await;
    }
    let accepted = state.dispatcher.navigation_committed(event)?;
    Ok(json!({ "accepted": accepted }))
}

async fn handle_tab_updated(state: &SharedState, params: Option<Value>) -> ProtocolResult<Value> {
    let params: TabUpdatedParams = parse_params("tabs/updated", params)?;
    state
        .tabs
        .update(
            params.tab_id,
            TabInfo {
                title: params.title,
                url: params.url,
            },
        )
        .await;
    Ok(json!({}))
}

async fn handle_tab_removed(state: &SharedState, params: Option<Value>) -> ProtocolResult<Value> {
    let params: TabRemovedParams = parse_params("tabs/removed", params)?;
    state.tabs.remove(params.tab_id).await;
    state.dispatcher.tab_removed(params.tab_id)?;
    Ok(json!({}))
}

async fn handle_snapshot(state: &SharedState, params: Option<Value>) -> ProtocolResult<Value> {
    let params: SnapshotParams = match params {
        Some(Value::Null) | None => SnapshotParams::default(),
        Some(_) => parse_params("session/snapshot", params)?,
    };
    let snapshot = state
        .coordinator()
        .snapshot(params.active_url.as_deref())
        .await?;
    serde_json::to_value(snapshot).map_err(ProtocolError::Json)
}

/// Queued behind any pending signals; responds once applied.
async fn handle_reset(state: &SharedState) -> ProtocolResult<Value> {
    state.dispatcher.reset()?;
    state.dispatcher.flush().await?;
    Ok(json!({}))
}

async fn handle_open_url(state: &SharedState, params: Option<Value>) -> ProtocolResult<Value> {
    let params: OpenUrlParams = parse_params("session/openUrl", params)?;
    state.coordinator().open_url(&params.url).await?;
    Ok(json!({}))
}

fn parse_params<T: serde::de::DeserializeOwned>(
    method: &str,
    params: Option<Value>,
) -> ProtocolResult<T> {
    match params {
        Some(args) => serde_json::from_value(args).map_err(|e| ProtocolError::InvalidParameters {
            method: method.to_string(),
            message: e.to_string(),
        }),
        None => Err(ProtocolError::InvalidParameters {
            method: method.to_string(),
            message: "Missing params".to_string(),
        }),
    }
}
