//! JSON-RPC 2.0 over newline-delimited stdio.
//!
//! The browser host writes one request or notification per line to stdin.
//! Responses, and commands for the host such as `host/openTab`, are written
//! one per line to stdout.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use super::{handle_method, SharedState, METHODS};
use crate::error::ProtocolError;
use crate::tabs::{HostCommand, HostCommandReceiver};

#[cfg(test)]
#[path = "rpc_tests.rs"]
mod rpc_tests;

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request identifier (None for notifications).
    pub id: Option<Value>,
    /// The method name to invoke.
    pub method: String,
    /// Optional parameters for the method.
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0").
    pub jsonrpc: String,
    /// Request identifier (null if it could not be determined).
    pub id: Value,
    /// The result on success (mutually exclusive with error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The error on failure (mutually exclusive with result).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// Error code (negative for predefined errors).
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
}

/// Notification sent to the host.
#[derive(Debug, Serialize)]
pub struct JsonRpcNotification {
    /// JSON-RPC version (always "2.0").
    pub jsonrpc: String,
    /// Method and params of the command.
    #[serde(flatten)]
    pub command: HostCommand,
}

impl From<HostCommand> for JsonRpcNotification {
    fn from(command: HostCommand) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            command,
        }
    }
}

/// Server identification returned by `initialize`.
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    /// Crate name.
    pub name: String,
    /// Crate version.
    pub version: String,
}

/// Result of the `initialize` handshake.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Who is answering.
    pub server_info: ServerInfo,
    /// Methods the server understands besides `initialize` and `ping`.
    pub methods: Vec<String>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// JSON-RPC server for the browser host.
pub struct RpcServer {
    state: SharedState,
    host_commands: HostCommandReceiver,
}

impl RpcServer {
    /// Create a server; `host_commands` are forwarded to the host as
    /// notifications.
    pub fn new(state: SharedState, host_commands: HostCommandReceiver) -> Self {
        Self {
            state,
            host_commands,
        }
    }

    /// Run the server using async stdio
    pub async fn run(self) -> std::io::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve requests from `reader` until EOF, writing to `writer`.
    pub async fn serve<R, W>(mut self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Session Weaver server starting...");

        let mut lines = reader.lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!("EOF received, shutting down");
                        break;
                    };
                    if let Some(response) = self.handle_line(&line).await {
                        write_message(&mut writer, &response).await?;
                    }
                }
                Some(command) = self.host_commands.recv() => {
                    write_message(&mut writer, &JsonRpcNotification::from(command)).await?;
                }
            }
        }

        while let Ok(command) = self.host_commands.try_recv() {
            write_message(&mut writer, &JsonRpcNotification::from(command)).await?;
        }

        Ok(())
    }

    /// Handle one input line. Returns `None` when no response is due.
    async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        debug!(request = %trimmed, "Received message");

        match serde_json::from_str::<JsonRpcRequest>(trimmed) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                error!(error = %e, "Failed to parse request");
                Some(JsonRpcResponse::error(
                    None,
                    -32700,
                    format!("Parse error: {}", e),
                ))
            }
        }
    }

    /// Handle a single JSON-RPC request.
    /// Returns None for notifications (requests without id).
    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let is_notification = request.id.is_none();

        if request.jsonrpc != "2.0" {
            warn!(version = %request.jsonrpc, "Unexpected JSON-RPC version");
            let err = ProtocolError::InvalidRequest {
                message: format!("unsupported jsonrpc version {:?}", request.jsonrpc),
            };
            return (!is_notification)
                .then(|| JsonRpcResponse::error(request.id, err.code(), err.to_string()));
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "ping" => JsonRpcResponse::success(request.id, Value::Object(Default::default())),
            method => match handle_method(&self.state, method, request.params).await {
                Ok(result) => JsonRpcResponse::success(request.id, result),
                Err(e) => {
                    if is_notification {
                        warn!(method = %method, error = %e, "Notification failed");
                    } else {
                        error!(method = %method, error = %e, "Request failed");
                    }
                    JsonRpcResponse::error(request.id, e.code(), e.to_string())
                }
            },
        };

        if is_notification {
            None
        } else {
            Some(response)
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling initialize request");

        let result = InitializeResult {
            server_info: ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            methods: METHODS.iter().map(|m| m.to_string()).collect(),
        };

        match serde_json::to_value(result) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => {
                error!(error = %e, "Failed to serialize initialize result");
                JsonRpcResponse::error(id, -32603, format!("Internal error: {}", e))
            }
        }
    }
}

async fn write_message<W, T>(writer: &mut W, message: &T) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let json = serde_json::to_string(message)?;
    debug!(message = %json, "Sending message");

    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
