//! Call command implementation.

use crate::cli::Output;
use crate::registry::{arguments_from_value, Arguments, Registry};
use crate::tools::interaction::USER_INPUT_NAME;
use anyhow::{Context, Result};

/// Invoke a single tool and print the string it returns.
pub async fn run_call(registry: &Registry, tool: &str, args: Option<&str>) -> Result<()> {
    let args = parse_args(args)?;

    let output = if needs_terminal(tool) {
        registry.call(tool, &args).await
    } else {
        let spinner = Output::spinner(&format!("Running {}...", tool));
        let output = registry.call(tool, &args).await;
        spinner.finish_and_clear();
        output
    };

    println!("{}", output);
    Ok(())
}

/// Tools that prompt on the terminal; a spinner would redraw over the prompt.
fn needs_terminal(tool: &str) -> bool {
    tool == USER_INPUT_NAME
}

fn parse_args(raw: Option<&str>) -> Result<Arguments> {
    let Some(raw) = raw else {
        return Ok(Arguments::new());
    };
    let value: serde_json::Value =
        serde_json::from_str(raw).context("--args must be valid JSON")?;
    Ok(arguments_from_value(value)?)
}
