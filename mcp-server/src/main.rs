/// WHMCS MCP Server - JSON-RPC (stdio) + HTTP API
///
/// Run with MCP:  ./whmcs-mcp (default)
/// Run with HTTP: WHMCS_MCP_MODE=http ./whmcs-mcp
///
/// Requires: WHMCS_URL, WHMCS_IDENTIFIER, WHMCS_SECRET, WHMCS_ACCESS_KEY
/// (environment or .env file)

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use whmcs_mcp::{http, rpc, ServerMode, WhmcsConfig, WhmcsMcp};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();

    // stdout belongs to the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = WhmcsConfig::from_env();
    let missing = config.missing_fields();
    if !missing.is_empty() {
        tracing::warn!(
            "Missing WHMCS configuration: {} (calls will fail until set)",
            missing.join(", ")
        );
    }

    let mode = ServerMode::from_env()?;
    let server = WhmcsMcp::new(config);

    match mode {
        ServerMode::Stdio => {
            eprintln!("WHMCS MCP server running on stdio");
            rpc::serve_stdio(&server).await
        }
        ServerMode::Http { port } => http::serve(server, port).await,
    }
}
