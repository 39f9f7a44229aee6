//! # Session Weaver
//!
//! Tracks browser navigation as a forest of per-tab trees. Every committed
//! top-level navigation becomes a node under the page the tab was previously
//! on; when a tab closes its tree is archived into a bounded, most-recent-first
//! history that can later be browsed, reopened or discarded.
//!
//! ## Architecture
//!
//! ```text
//! Browser host ──stdio JSON-RPC──> RpcServer ──> SignalDispatcher (ordered queue)
//!                                                      │
//!                                                      ▼
//!                                  TabRegistry <── SessionCoordinator ──> Storage
//!                                                      │                (SQLite / memory)
//!                                                      ▼
//!                                                 tree::Forest
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use session_weaver::{Config, AppState, RpcServer};
//! use session_weaver::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let storage = SqliteStorage::new(&config.storage.database).await?;
//!     let (state, host_commands, _worker) = AppState::new(config, Arc::new(storage));
//!     RpcServer::new(Arc::new(state), host_commands).run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// JSON-RPC server and request handling.
pub mod server;
/// Session coordination: signal filtering, ordering and forest mutation.
pub mod session;
/// Read-only views of the forest for display.
pub mod snapshot;
/// Storage backends for the persisted forest.
pub mod storage;
/// Browser tab host abstraction.
pub mod tabs;
/// Navigation tree model.
pub mod tree;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use server::{AppState, RpcServer, SharedState};
pub use session::{NavigationEvent, NavigationOutcome, SessionCoordinator, SignalDispatcher};
pub use tree::{Forest, NavNode, TabId};
