//! HTTP API server for orchestrators that speak REST.
//!
//! Provides endpoints to list tools and invoke them by name.

use crate::cli::Output;
use crate::registry::{arguments_from_value, Arguments, Registry, Tool, ToolSpec};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, registry: Registry) -> anyhow::Result<()> {
    let app = router(Arc::new(registry));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Output::header("Agent Toolbox API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("List Tools", "GET  /tools");
    Output::kv("Describe Tool", "GET  /tools/{name}");
    Output::kv("Call Tool", "POST /tools/{name}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(registry: Arc<Registry>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/tools/{name}", get(describe_tool).post(call_tool))
        .layer(cors)
        .with_state(registry)
}

// === Response Types ===

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    description: String,
    inputs: Value,
    output_type: String,
}

impl From<&ToolSpec> for ToolInfo {
    fn from(spec: &ToolSpec) -> Self {
        Self {
            name: spec.name.clone(),
            description: spec.description.clone(),
            inputs: spec.json_schema(),
            output_type: spec.output_type.clone(),
        }
    }
}

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
    total: usize,
}

#[derive(Serialize)]
struct CallResponse {
    tool: String,
    output: String,
    is_error: bool,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn not_found(name: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Unknown tool: {}", name),
        }),
    )
        .into_response()
}

/// An empty body means no arguments.
fn parse_body(body: &[u8]) -> Result<Arguments, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Arguments::new());
    }
    let value: Value = serde_json::from_slice(body).map_err(|e| e.to_string())?;
    arguments_from_value(value).map_err(|e| e.to_string())
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_tools(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    let tools: Vec<ToolInfo> = registry.specs().map(ToolInfo::from).collect();
    Json(ToolListResponse {
        total: tools.len(),
        tools,
    })
}

async fn describe_tool(
    State(registry): State<Arc<Registry>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match registry.get(&name) {
        Some(tool) => Json(ToolInfo::from(tool.spec())).into_response(),
        None => not_found(&name),
    }
}

async fn call_tool(
    State(registry): State<Arc<Registry>>,
    Path(name): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    if registry.get(&name).is_none() {
        return not_found(&name);
    }

    let args = match parse_body(&body) {
        Ok(args) => args,
        Err(error) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
        }
    };

    let (output, is_error) = match registry.invoke(&name, &args).await {
        Ok(output) => (output, false),
        Err(e) => (e.to_string(), true),
    };

    Json(CallResponse {
        tool: name,
        output,
        is_error,
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::BuiltinTool;
    use crate::tools::{FileReaderTool, FinalAnswerTool};
    use serde_json::json;

    async fn spawn() -> String {
        let registry = Registry::new(vec![
            BuiltinTool::FileReader(FileReaderTool::new()),
            BuiltinTool::FinalAnswer(FinalAnswerTool::new()),
        ])
        .unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(Arc::new(registry))).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_list_and_describe() {
        let base = spawn().await;
        let client = reqwest::Client::new();

        let list: Value = client
            .get(format!("{}/tools", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(list["total"], 2);
        assert_eq!(list["tools"][1]["name"], "final_answer");

        let missing = client
            .get(format!("{}/tools/teleport", base))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_call_tool() {
        let base = spawn().await;
        let client = reqwest::Client::new();

        let ok: Value = client
            .post(format!("{}/tools/final_answer", base))
            .json(&json!({ "answer": "150" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(ok, json!({ "tool": "final_answer", "output": "150", "is_error": false }));

        let failed: Value = client
            .post(format!("{}/tools/file_reader", base))
            .json(&json!({ "file_path": "missing.xlsx" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(failed["is_error"], true);
        assert_eq!(failed["output"], "File not found: missing.xlsx");

        let bad = client
            .post(format!("{}/tools/final_answer", base))
            .body("[1, 2]")
            .send()
            .await
            .unwrap();
        assert_eq!(bad.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_body() {
        assert!(parse_body(b"").unwrap().is_empty());
        assert_eq!(parse_body(br#"{"a": 1}"#).unwrap()["a"], 1);
        assert!(parse_body(b"nope").is_err());
    }
}
