/// HTTP transport
///
/// - GET  /health        - Service status
/// - GET  /tools         - List all tools
/// - POST /tools/:name   - Call a tool, body is the argument object
/// - POST /mcp           - One JSON-RPC message

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use mcp_protocol::{CallToolResult, ToolsListResult};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::dispatcher::WhmcsMcp;
use crate::error::ToolError;
use crate::rpc::{self, SERVER_NAME, SERVER_VERSION};
use crate::tools::Tool;

pub fn router(server: WhmcsMcp) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools_http))
        .route("/tools/:name", post(call_tool_http))
        .route("/mcp", post(mcp_http))
        .layer(CorsLayer::permissive())
        .with_state(server)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVER_NAME,
        "protocols": ["http", "jsonrpc-stdio"],
        "version": SERVER_VERSION
    }))
}

async fn list_tools_http(State(server): State<WhmcsMcp>) -> Json<ToolsListResult> {
    Json(server.list_tools())
}

/// Always 200: tool failures travel inside the envelope
async fn call_tool_http(
    State(server): State<WhmcsMcp>,
    Path(name): Path<String>,
    body: Bytes,
) -> Json<CallToolResult> {
    let arguments = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => value,
            Err(e) => {
                let err = match Tool::from_name(&name) {
                    Some(tool) => ToolError::invalid_arguments(tool.name(), e),
                    None => ToolError::UnknownTool(name),
                };
                return Json(CallToolResult::error(err.to_string(), err.meta()));
            }
        }
    };

    Json(server.call_tool(&name, arguments).await)
}

async fn mcp_http(State(server): State<WhmcsMcp>, body: String) -> Response {
    match rpc::handle_message(&server, &body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Start HTTP server
pub async fn serve(server: WhmcsMcp, port: u16) -> Result<()> {
    let app = router(server);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    eprintln!("✓ WHMCS MCP server listening on http://0.0.0.0:{}", port);
    eprintln!("  GET    /health");
    eprintln!("  GET    /tools");
    eprintln!("  POST   /tools/:name");
    eprintln!("  POST   /mcp");

    axum::serve(listener, app).await?;

    Ok(())
}
