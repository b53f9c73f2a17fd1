//! MCP command implementation.

use crate::config::Settings;
use crate::mcp::McpServer;
use crate::registry::Registry;
use crate::tools::interaction::USER_INPUT_NAME;
use anyhow::Result;
use std::sync::Arc;

/// Run the MCP server. Stdin carries JSON-RPC, so `user_input` is not served.
pub async fn run_mcp(settings: &Settings) -> Result<()> {
    let registry = Registry::from_settings(settings)?.without(USER_INPUT_NAME);
    McpServer::new(Arc::new(registry)).run().await
}
