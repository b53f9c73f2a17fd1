//! List command implementation.

use crate::cli::Output;
use crate::registry::Registry;
use anyhow::Result;

/// Print every registered tool.
pub fn run_list(registry: &Registry) -> Result<()> {
    Output::header(&format!("Available Tools ({})", registry.len()));

    for spec in registry.specs() {
        let inputs: Vec<(String, String, bool)> = spec
            .inputs
            .iter()
            .map(|(name, input)| (name.clone(), input.kind.clone(), input.nullable))
            .collect();
        Output::tool_info(&spec.name, &spec.description, &inputs);
    }

    println!();
    Ok(())
}
