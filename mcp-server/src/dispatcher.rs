/// Tool dispatcher
///
/// Routes a tool call to its WHMCS action and folds every outcome, failures
/// included, into a [`CallToolResult`] envelope.

use std::sync::Arc;

use mcp_protocol::{CallToolResult, ToolsListResult};
use serde_json::Value;

use crate::config::WhmcsConfig;
use crate::error::ToolError;
use crate::gateway::WhmcsGateway;
use crate::tools::{list_tools, Tool};

/// WHMCS MCP server - holds the gateway shared by all calls
#[derive(Clone)]
pub struct WhmcsMcp {
    gateway: Arc<WhmcsGateway>,
}

impl WhmcsMcp {
    pub fn new(config: WhmcsConfig) -> Self {
        Self::with_gateway(WhmcsGateway::new(config))
    }

    pub fn with_gateway(gateway: WhmcsGateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }

    /// List all available tools
    pub fn list_tools(&self) -> ToolsListResult {
        ToolsListResult { tools: list_tools() }
    }

    /// Run a tool and return the raw WHMCS response
    pub async fn dispatch(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let tool = Tool::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let args = tool.encode_arguments(arguments)?;

        tracing::info!("→ {} → WHMCS {}", tool.name(), tool.action());
        self.gateway.call(tool.action(), &args).await
    }

    /// Call a tool and wrap the outcome in the MCP envelope
    ///
    /// Never fails: errors come back as `isError: true` with the error kind in `_meta`.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> CallToolResult {
        let outcome = self.dispatch(name, arguments).await.and_then(|value| {
            serde_json::to_string_pretty(&value)
                .map_err(|e| ToolError::MalformedResponse(e.to_string()))
        });

        match outcome {
            Ok(text) => {
                tracing::info!("✓ {} succeeded ({} bytes)", name, text.len());
                CallToolResult::text(text)
            }
            Err(e) => {
                tracing::error!("✗ {} failed: {}", name, e);
                CallToolResult::error(e.to_string(), e.meta())
            }
        }
    }
}
