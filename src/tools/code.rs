//! Code execution in a throwaway interpreter process.

use crate::config::CodeSettings;
use crate::error::{ToolError, ToolResult};
use crate::registry::{required_str, Arguments, InputSpec, Tool, ToolSpec};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

pub const NAME: &str = "python_interpreter";

/// Runs a snippet in a fresh interpreter with an empty environment and its
/// own scratch directory.
pub struct PythonInterpreterTool {
    spec: ToolSpec,
    interpreter: String,
    args: Vec<String>,
    timeout: Duration,
}

impl PythonInterpreterTool {
    pub fn new(settings: &CodeSettings) -> Self {
        let spec = ToolSpec::new(
            NAME,
            "Executes Python code for calculations, data parsing, and processing. \
             Useful for math, table operations, and any small script execution.",
        )
        .input(
            "code",
            InputSpec::new("string", "The python code to run in interpreter"),
        );

        Self {
            spec,
            interpreter: settings.interpreter.clone(),
            args: settings.args.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    #[instrument(skip(self, code), fields(interpreter = %self.interpreter))]
    async fn run(&self, code: &str) -> ToolResult {
        let scratch = tempfile::tempdir()
            .map_err(|e| ToolError::Execution(format!("Failed to create scratch dir: {}", e)))?;
        let script = scratch.path().join("snippet.py");
        tokio::fs::write(&script, code)
            .await
            .map_err(|e| ToolError::Execution(format!("Failed to write snippet: {}", e)))?;

        let mut command = Command::new(&self.interpreter);
        command
            .args(&self.args)
            .arg(&script)
            .current_dir(scratch.path())
            .env_clear()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Ok(path) = std::env::var("PATH") {
            command.env("PATH", path);
        }

        let child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::Execution(format!("Interpreter '{}' not found", self.interpreter))
            } else {
                ToolError::Execution(format!("Failed to start {}: {}", self.interpreter, e))
            }
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result
                .map_err(|e| ToolError::Execution(format!("Interpreter failed: {}", e)))?,
            Err(_) => {
                warn!("Snippet exceeded {}s", self.timeout.as_secs());
                return Err(ToolError::Execution(format!(
                    "Code execution timed out after {} seconds",
                    self.timeout.as_secs()
                )));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(status = ?output.status, "Snippet failed");
            return Err(ToolError::Execution(stderr.trim_end().to_string()));
        }

        Ok(format!("Stdout:\n{}", stdout))
    }
}

#[async_trait]
impl Tool for PythonInterpreterTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, args: &Arguments) -> ToolResult {
        let code = required_str(args, "code")?;
        self.run(code).await
    }
}
