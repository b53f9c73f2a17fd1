//! Client for the evaluation API that hands out benchmark questions.

use crate::config::ScoringSettings;
use crate::error::{Result, ToolboxError};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, instrument};

/// Fetch the question list from `<api_url>/questions`.
#[instrument(skip_all, fields(api_url = %settings.api_url))]
pub async fn fetch_questions(settings: &ScoringSettings) -> Result<Vec<Value>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?;

    let url = format!("{}/questions", settings.api_url.trim_end_matches('/'));
    let response = client.get(&url).send().await?.error_for_status()?;
    let body: Value = response.json().await?;

    match body {
        Value::Array(questions) => {
            info!("Fetched {} questions", questions.len());
            Ok(questions)
        }
        other => Err(ToolboxError::Scoring(format!(
            "Expected a list of questions, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
