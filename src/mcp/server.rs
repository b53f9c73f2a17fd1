//! MCP server implementation.

use super::protocol::*;
use crate::registry::{arguments_from_value, Registry};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "agent-toolbox";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Serves a tool registry over MCP.
pub struct McpServer {
    registry: Arc<Registry>,
}

impl McpServer {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Run the MCP server (reads from stdin, writes to stdout).
    pub async fn run(&self) -> anyhow::Result<()> {
        info!("MCP server starting with {} tools", self.registry.len());
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Process newline-delimited requests until the reader is exhausted.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => {
                    warn!("Failed to parse request: {}", e);
                    Some(JsonRpcResponse::error(None, PARSE_ERROR, "Parse error"))
                }
            };

            if let Some(response) = response {
                let mut payload = serde_json::to_vec(&response)?;
                payload.push(b'\n');
                writer.write_all(&payload).await?;
                writer.flush().await?;
            }
        }

        info!("Input closed, MCP server stopping");
        Ok(())
    }

    /// Handle a single JSON-RPC request. Notifications get no response.
    pub(crate) async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "Handling request");

        if request.is_notification() {
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "ping" => JsonRpcResponse::success(request.id, Value::Object(Default::default())),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            _ => JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {}", request.method),
            ),
        };
        Some(response)
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability { list_changed: false },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        };

        respond(id, &result)
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let tools = self
            .registry
            .specs()
            .map(|spec| ToolDescriptor {
                name: spec.name.clone(),
                description: spec.description.clone(),
                input_schema: spec.json_schema(),
            })
            .collect();

        respond(id, &ToolsListResult { tools })
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        INVALID_PARAMS,
                        &format!("Invalid params: {}", e),
                    )
                }
            },
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        let result = match arguments_from_value(params.arguments.unwrap_or(Value::Null)) {
            Ok(args) => match self.registry.invoke(&params.name, &args).await {
                Ok(output) => ToolCallResult::text(output),
                Err(e) => ToolCallResult::error(e.to_string()),
            },
            Err(e) => ToolCallResult::error(e.to_string()),
        };

        respond(id, &result)
    }
}

fn respond<T: Serialize>(id: Option<Value>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, &e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::BuiltinTool;
    use crate::tools::{FileReaderTool, FinalAnswerTool};
    use serde_json::json;

    fn server() -> McpServer {
        let registry = Registry::new(vec![
            BuiltinTool::FileReader(FileReaderTool::new()),
            BuiltinTool::FinalAnswer(FinalAnswerTool::new()),
        ])
        .unwrap();
        McpServer::new(Arc::new(registry))
    }

    async fn exchange(server: &McpServer, request: Value) -> Value {
        let request: JsonRpcRequest = serde_json::from_value(request).unwrap();
        let response = server.handle_request(request).await.unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = exchange(
            &server(),
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        )
        .await;
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], SERVER_NAME);
    }

    #[tokio::test]
    async fn test_tools_list() {
        let response = exchange(
            &server(),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        )
        .await;
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "file_reader");
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["file_path"]));
    }

    #[tokio::test]
    async fn test_tools_call() {
        let server = server();
        let ok = exchange(
            &server,
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                   "params": {"name": "final_answer", "arguments": {"answer": "42"}}}),
        )
        .await;
        assert_eq!(ok["result"]["content"][0]["text"], "42");
        assert!(ok["result"].get("isError").is_none());

        let failed = exchange(
            &server,
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
                   "params": {"name": "file_reader", "arguments": {"file_path": "missing.json"}}}),
        )
        .await;
        assert_eq!(failed["result"]["isError"], true);
        assert_eq!(
            failed["result"]["content"][0]["text"],
            "File not found: missing.json"
        );
    }

    #[tokio::test]
    async fn test_unknown_method_and_notifications() {
        let server = server();
        let response = exchange(
            &server,
            json!({"jsonrpc": "2.0", "id": 5, "method": "resources/list"}),
        )
        .await;
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);

        let notification: JsonRpcRequest = serde_json::from_value(
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .unwrap();
        assert!(server.handle_request(notification).await.is_none());
    }

    #[tokio::test]
    async fn test_serve_writes_one_line_per_response() {
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
            "not json\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
        );
        let mut output = Vec::new();
        server()
            .serve(input.as_bytes(), &mut output)
            .await
            .unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["error"]["code"], PARSE_ERROR);
    }
}
