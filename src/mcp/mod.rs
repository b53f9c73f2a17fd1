//! MCP (Model Context Protocol) server.
//!
//! Exposes the tool registry to an orchestrating agent over JSON-RPC 2.0 on
//! stdio.

mod protocol;
mod server;

pub use server::McpServer;
