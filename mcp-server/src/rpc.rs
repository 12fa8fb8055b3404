/// JSON-RPC routing for MCP
///
/// Maps protocol methods onto the [`WhmcsMcp`] dispatcher and drives the
/// newline-delimited stdio transport.

use anyhow::Result;
use mcp_protocol::{
    CallToolParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::dispatcher::WhmcsMcp;

pub const SERVER_NAME: &str = "whmcs-mcp-server";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Handle one raw message; `None` means nothing is sent back
pub async fn handle_message(server: &WhmcsMcp, raw: &str) -> Option<JsonRpcResponse> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Parse error: {}", e);
            return Some(JsonRpcResponse::err(Value::Null, JsonRpcError::parse_error(e)));
        }
    };

    if value.is_array() {
        return Some(JsonRpcResponse::err(
            Value::Null,
            JsonRpcError::invalid_request("batch requests are not supported"),
        ));
    }

    let id = value.get("id").cloned();
    match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(request) => handle_request(server, request).await,
        // Responses and malformed notifications have nobody to answer
        Err(_) if id.is_none() => None,
        Err(e) => Some(JsonRpcResponse::err(
            id.unwrap_or(Value::Null),
            JsonRpcError::invalid_request(e),
        )),
    }
}

/// Route a parsed request to its method handler
pub async fn handle_request(server: &WhmcsMcp, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    if request.is_notification() {
        tracing::debug!("Notification: {}", request.method);
        return None;
    }

    let id = request.id.clone().unwrap_or(Value::Null);
    let outcome = match request.method.as_str() {
        "initialize" => to_result(&InitializeResult::tools_only(SERVER_NAME, SERVER_VERSION)),
        "ping" => Ok(json!({})),
        "tools/list" => to_result(&server.list_tools()),
        "tools/call" => call_tool(server, request.params).await,
        method => Err(JsonRpcError::method_not_found(method)),
    };

    Some(match outcome {
        Ok(result) => JsonRpcResponse::ok(id, result),
        Err(error) => JsonRpcResponse::err(id, error),
    })
}

async fn call_tool(server: &WhmcsMcp, params: Option<Value>) -> Result<Value, JsonRpcError> {
    let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(JsonRpcError::invalid_params)?;

    let result = server
        .call_tool(&params.name, params.arguments.unwrap_or(Value::Null))
        .await;
    to_result(&result)
}

fn to_result<T: serde::Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(JsonRpcError::internal)
}

/// Serve newline-delimited JSON-RPC until the reader hits end of input
pub async fn serve<R, W>(server: &WhmcsMcp, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(response) = handle_message(server, &line).await {
            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }
    }

    Ok(())
}

/// Attach to the process stdin/stdout
pub async fn serve_stdio(server: &WhmcsMcp) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    serve(server, stdin, tokio::io::stdout()).await
}
