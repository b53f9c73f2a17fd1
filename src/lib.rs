//! Agent Toolbox - pre-built tools for an orchestrating agent
//!
//! A fixed catalog of capabilities behind one calling convention: a tool is
//! looked up by name, invoked with a JSON argument map, and answers with a
//! string. Failures are typed inside the crate and rendered as text at the
//! boundary, so an agent always gets something it can read.
//!
//! # Architecture
//!
//! - `registry` - The `Tool` contract, the `BuiltinTool` catalog and `Registry`
//! - `tools` - Tool implementations (code, search, webpage, audio, files, prompts)
//! - `audio` - ffprobe/ffmpeg helpers for splitting long recordings
//! - `openai` - OpenAI client construction for the transcription tools
//! - `scoring` - Client for the evaluation API's question list
//! - `mcp` - MCP server exposing the registry over stdio
//! - `config` - Configuration management
//! - `cli` - Command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use agent_toolbox::config::Settings;
//! use agent_toolbox::registry::Registry;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let registry = Registry::from_settings(&settings)?;
//!
//!     let args = json!({ "query": "capital of Italy" });
//!     let output = registry
//!         .call("web_search", args.as_object().unwrap())
//!         .await;
//!     println!("{}", output);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod openai;
pub mod registry;
pub mod scoring;
pub mod tools;

pub use error::{Result, ToolError, ToolboxError};
