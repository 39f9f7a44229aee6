//! Unit tests for the JSON-RPC server.

use super::*;
use crate::config::Config;
use crate::server::AppState;
use crate::storage::MemoryStorage;
use serde_json::json;
use std::sync::Arc;

fn server() -> RpcServer {
    let (state, host_commands, _worker) =
        AppState::new(Config::default(), Arc::new(MemoryStorage::new()));
    RpcServer::new(Arc::new(state), host_commands)
}

/// Feed `input` through a fresh server and return every output message.
async fn run_lines(input: &str) -> Vec<Value> {
    let mut output = Vec::new();
    server()
        .serve(input.as_bytes(), &mut output)
        .await
        .unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

// ============================================================================
// JsonRpcResponse
// ============================================================================

#[test]
fn test_jsonrpc_response_success_with_id() {
    let response = JsonRpcResponse::success(Some(json!(1)), json!({"result": "ok"}));

    assert_eq!(response.jsonrpc, "2.0");
    assert_eq!(response.id, json!(1));
    assert!(response.error.is_none());
    assert_eq!(response.result.unwrap()["result"], "ok");
}

#[test]
fn test_jsonrpc_response_error_without_id() {
    let response = JsonRpcResponse::error(None, -32700, "Parse error");

    assert_eq!(response.id, Value::Null);
    assert_eq!(response.error.unwrap().code, -32700);
}

#[test]
fn test_jsonrpc_response_serialization_omits_error() {
    let response = JsonRpcResponse::success(Some(json!(1)), json!({"test": true}));
    let serialized = serde_json::to_string(&response).unwrap();

    assert!(serialized.contains("\"jsonrpc\":\"2.0\""));
    assert!(serialized.contains("\"result\""));
    assert!(!serialized.contains("\"error\""));
}

#[test]
fn test_host_notification_shape() {
    let notification = JsonRpcNotification::from(HostCommand::OpenTab {
        url: "https://a.test/".to_string(),
    });
    let value = serde_json::to_value(&notification).unwrap();

    assert_eq!(
        value,
        json!({
            "jsonrpc": "2.0",
            "method": "host/openTab",
            "params": {"url": "https://a.test/"}
        })
    );
}

// ============================================================================
// serve loop
// ============================================================================

#[tokio::test]
async fn test_initialize_and_ping() {
    let out = run_lines(
        "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\"}\n\
         {\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n",
    )
    .await;

    assert_eq!(out.len(), 2);
    assert_eq!(out[0]["result"]["serverInfo"]["name"], "session-weaver");
    assert!(out[0]["result"]["methods"]
        .as_array()
        .unwrap()
        .contains(&json!("navigation/committed")));
    assert_eq!(out[1]["id"], 2);
    assert_eq!(out[1]["result"], json!({}));
}

#[tokio::test]
async fn test_parse_error() {
    let out = run_lines("this is not json\n").await;

    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["error"]["code"], -32700);
    assert_eq!(out[0]["id"], Value::Null);
}

#[tokio::test]
async fn test_unknown_method_and_bad_params() {
    let out = run_lines(
        "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"nope\"}\n\
         {\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tabs/removed\",\"params\":{\"tab\":1}}\n",
    )
    .await;

    assert_eq!(out[0]["error"]["code"], -32601);
    assert_eq!(out[1]["error"]["code"], -32602);
}

#[tokio::test]
async fn test_wrong_version_is_invalid_request() {
    let out = run_lines(
        "{\"jsonrpc\":\"1.0\",\"id\":3,\"method\":\"ping\"}\n\
         {\"jsonrpc\":\"1.0\",\"method\":\"session/reset\"}\n",
    )
    .await;

    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["id"], 3);
    assert_eq!(out[0]["error"]["code"], -32600);
}

#[tokio::test]
async fn test_notifications_get_no_response() {
    let out = run_lines(
        "{\"jsonrpc\":\"2.0\",\"method\":\"tabs/updated\",\"params\":{\"tabId\":1,\"url\":\"https://a.test/\"}}\n\
         {\"jsonrpc\":\"2.0\",\"method\":\"unknown/notification\"}\n\
         \n",
    )
    .await;

    assert!(out.is_empty());
}

#[tokio::test]
async fn test_open_url_forwards_host_command() {
    let out = run_lines(
        "{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"session/openUrl\",\"params\":{\"url\":\"https://a.test/\"}}\n",
    )
    .await;

    assert_eq!(out.len(), 2);
    assert!(out
        .iter()
        .any(|m| m["id"] == 7 && m["result"] == json!({})));
    assert!(out
        .iter()
        .any(|m| m["method"] == "host/openTab" && m["params"]["url"] == "https://a.test/"));
}

#[tokio::test(start_paused = true)]
async fn test_reset_request_clears_forest() {
    let out = run_lines(
        "{\"jsonrpc\":\"2.0\",\"method\":\"tabs/updated\",\"params\":{\"tabId\":1,\"title\":\"A\",\"url\":\"https://a.test/\"}}\n\
         {\"jsonrpc\":\"2.0\",\"method\":\"navigation/committed\",\"params\":{\"tabId\":1,\"url\":\"https://a.test/\",\"frameId\":0}}\n\
         {\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"session/reset\"}\n\
         {\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"session/snapshot\"}\n",
    )
    .await;

    assert_eq!(out.len(), 2);
    assert_eq!(out[0]["id"], 1);
    assert_eq!(out[1]["result"]["activeTrees"], json!([]));
}
