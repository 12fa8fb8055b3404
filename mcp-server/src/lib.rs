/// WHMCS MCP Server Library
///
/// Exposes read-only WHMCS billing operations as MCP tools:
/// - get_client_details: Details for one client
/// - get_clients: List clients
/// - get_invoices: List invoices
/// - get_orders: List orders
/// - get_products: List products
/// - get_tickets: List support tickets
///
/// Every call becomes one form POST to the WHMCS API; the JSON response is
/// handed back as pretty-printed text.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod http;
pub mod rpc;
pub mod tools;

pub use config::{ServerMode, WhmcsConfig};
pub use dispatcher::WhmcsMcp;
pub use error::{ErrorKind, ToolError};
pub use gateway::WhmcsGateway;
pub use tools::{list_tools, Tool};
