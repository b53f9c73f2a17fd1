//! Smoke command: exercise every tool once against fixed inputs.
//!
//! Failures are printed and the run moves on; the command itself only fails
//! when the scratch CSV cannot be written.

use crate::cli::output::preview;
use crate::registry::{Arguments, Registry};
use anyhow::Result;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

const SNIPPET_CHARS: usize = 200;

/// One smoke-test step.
#[derive(Debug)]
struct SmokeCase {
    tool: &'static str,
    args: Arguments,
    label: &'static str,
    /// Print only this many leading characters of the output.
    truncate: Option<usize>,
    /// Skip the case unless this file exists.
    requires: Option<PathBuf>,
}

impl SmokeCase {
    fn new(tool: &'static str, args: Value) -> Self {
        Self {
            tool,
            args: args.as_object().cloned().unwrap_or_default(),
            label: "Output",
            truncate: None,
            requires: None,
        }
    }

    fn snippet(mut self) -> Self {
        self.label = "Output snippet";
        self.truncate = Some(SNIPPET_CHARS);
        self
    }

    fn labelled(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    fn requires(mut self, path: &str) -> Self {
        self.requires = Some(PathBuf::from(path));
        self
    }
}

fn smoke_cases(short_audio: &str, long_audio: &str, csv_path: &Path) -> Vec<SmokeCase> {
    vec![
        SmokeCase::new(
            "python_interpreter",
            json!({ "code": "\nresult = 2 + 2\nprint(result)\n" }),
        ),
        SmokeCase::new("web_search", json!({ "query": "What is the capital of Italy?" })),
        SmokeCase::new("google_search", json!({ "query": "Eiffel Tower height" })),
        SmokeCase::new("visit_webpage", json!({ "url": "https://example.com" })).snippet(),
        SmokeCase::new("transcriber", json!({ "audio": short_audio })).requires(short_audio),
        SmokeCase::new(
            "youtube_transcript",
            json!({ "video_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ" }),
        )
        .snippet(),
        SmokeCase::new("whisper_transcription", json!({ "audio_file": long_audio }))
            .requires(long_audio),
        SmokeCase::new("file_reader", json!({ "file_path": csv_path.to_string_lossy() }))
            .labelled("Output CSV"),
        SmokeCase::new(
            "final_answer",
            json!({ "answer": "Answer with only the number: What is 10 * 15?" }),
        ),
    ]
}

/// Run the smoke test. `user_input` needs an operator and is left out.
pub async fn run_smoke(registry: &Registry, short_audio: &str, long_audio: &str) -> Result<()> {
    let scratch = tempfile::tempdir()?;
    let csv_path = scratch.path().join("test.csv");
    std::fs::write(&csv_path, "col1,col2\n1,2\n3,4\n")?;

    for case in smoke_cases(short_audio, long_audio, &csv_path) {
        println!("\n=== Testing {} ===", case.tool);

        if let Some(path) = &case.requires {
            if !path.exists() {
                println!("Skip: no file {}", path.display());
                continue;
            }
        }

        match registry.invoke(case.tool, &case.args).await {
            Ok(output) => {
                let shown: &str = match case.truncate {
                    Some(max) => preview(&output, max),
                    None => &output,
                };
                println!("{}: {}", case.label, shown);
            }
            Err(e) => println!("Error: {}", e),
        }
    }

    println!("\n=== Tests Completed ===");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cases_follow_catalog_order() {
        let cases = smoke_cases("a.wav", "b.mp3", Path::new("/tmp/test.csv"));
        let tools: Vec<&str> = cases.iter().map(|c| c.tool).collect();
        assert_eq!(
            tools,
            vec![
                "python_interpreter",
                "web_search",
                "google_search",
                "visit_webpage",
                "transcriber",
                "youtube_transcript",
                "whisper_transcription",
                "file_reader",
                "final_answer",
            ]
        );
    }

    #[test]
    fn test_audio_cases_require_files() {
        let cases = smoke_cases("a.wav", "b.mp3", Path::new("/tmp/test.csv"));
        let gated: Vec<_> = cases
            .iter()
            .filter_map(|c| c.requires.as_ref().map(|p| (c.tool, p.clone())))
            .collect();
        assert_eq!(
            gated,
            vec![
                ("transcriber", PathBuf::from("a.wav")),
                ("whisper_transcription", PathBuf::from("b.mp3")),
            ]
        );
    }

    #[test]
    fn test_snippet_cases() {
        let cases = smoke_cases("a.wav", "b.mp3", Path::new("/tmp/test.csv"));
        for case in cases.iter().filter(|c| c.truncate.is_some()) {
            assert_eq!(case.label, "Output snippet");
            assert!(matches!(case.tool, "visit_webpage" | "youtube_transcript"));
        }
    }
}
