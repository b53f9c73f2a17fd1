//! Questions command: fetch the benchmark questions from the scoring API.

use crate::cli::Output;
use crate::config::Settings;
use crate::scoring::fetch_questions;
use anyhow::Result;

/// Print the question count followed by the pretty-printed list.
pub async fn run_questions(settings: &Settings) -> Result<()> {
    let spinner = Output::spinner("Fetching questions...");
    let result = fetch_questions(&settings.scoring).await;
    spinner.finish_and_clear();

    let questions = result?;
    Output::success(&format!("Received {} questions.", questions.len()));
    println!("{}", serde_json::to_string_pretty(&questions)?);

    Ok(())
}
