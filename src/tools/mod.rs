//! Tool implementations.
//!
//! Each module owns one capability family. The tools are thin: they validate
//! arguments, call out to a service, subprocess or file parser, and shape the
//! reply into text.

pub mod code;
pub mod files;
pub mod interaction;
pub mod search;
pub mod transcribe;
pub mod webpage;
pub mod youtube;

pub use code::PythonInterpreterTool;
pub use files::FileReaderTool;
pub use interaction::{FinalAnswerTool, Prompter, TerminalPrompter, UserInputTool};
pub use search::{DuckDuckGoSearchTool, GoogleSearchTool};
pub use transcribe::{SpeechToTextTool, WhisperTranscriptionTool};
pub use webpage::VisitWebpageTool;
pub use youtube::YoutubeTranscriptTool;

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid regex"));

/// Build a reqwest client with a timeout and optional user agent.
pub(crate) fn build_http_client(
    timeout_secs: u64,
    user_agent: Option<&str>,
) -> crate::error::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(timeout_secs));
    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent);
    }
    Ok(builder.build()?)
}

/// Decode named and numeric HTML entities. Unknown entities are kept as-is.
pub(crate) fn html_decode(s: &str) -> String {
    ENTITY
        .replace_all(s, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

/// Remove markup, decode entities and collapse whitespace.
pub(crate) fn strip_tags(s: &str) -> String {
    let text = TAG.replace_all(s, "");
    let text = html_decode(&text);
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}
