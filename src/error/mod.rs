use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid or missing configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Persisting or loading the forest failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The browser host could not answer.
    #[error("Tab error: {0}")]
    Tab(#[from] TabError),

    /// Malformed host message.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Anything else.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Opening the database failed.
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    /// A statement failed.
    #[error("Query failed: {message}")]
    Query { message: String },

    /// Schema migration failed.
    #[error("Migration failed: {message}")]
    Migration { message: String },

    /// The stored forest is not valid JSON for the current layout.
    #[error("Forest serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Raw driver error.
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Errors raised by the browser host when querying or opening tabs
#[derive(Debug, Error)]
pub enum TabError {
    /// The tab is closed or unknown.
    #[error("Tab not found: {tab_id}")]
    NotFound { tab_id: i64 },

    /// The host side of the command channel is gone.
    #[error("Browser host unavailable: {message}")]
    HostUnavailable { message: String },
}

/// JSON-RPC protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Not a valid JSON-RPC 2.0 request object.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// No handler for the method.
    #[error("Unknown method: {method}")]
    UnknownMethod { method: String },

    /// Params missing or of the wrong shape.
    #[error("Invalid parameters for {method}: {message}")]
    InvalidParameters { method: String, message: String },

    /// The handler failed while running.
    #[error("Execution failed: {message}")]
    ExecutionFailed { message: String },

    /// Result could not be encoded.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProtocolError {
    /// JSON-RPC 2.0 error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            ProtocolError::InvalidRequest { .. } => -32600,
            ProtocolError::UnknownMethod { .. } => -32601,
            ProtocolError::InvalidParameters { .. } => -32602,
            ProtocolError::ExecutionFailed { .. } | ProtocolError::Json(_) => -32603,
        }
    }
}

impl From<AppError> for ProtocolError {
    fn from(err: AppError) -> Self {
        ProtocolError::ExecutionFailed {
            message: err.to_string(),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for tab host operations
pub type TabResult<T> = Result<T, TabError>;

/// Result type alias for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;
