//! Webpage fetch: download a URL and hand back readable text.

use super::build_http_client;
use crate::config::FetchSettings;
use crate::error::{ToolError, ToolResult};
use crate::registry::{required_str, Arguments, InputSpec, Tool, ToolSpec};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, instrument};

pub const NAME: &str = "visit_webpage";

/// Line width used when rendering HTML to text.
const RENDER_WIDTH: usize = 120;

static EXTRA_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

pub struct VisitWebpageTool {
    spec: ToolSpec,
    client: reqwest::Client,
    max_length: usize,
}

impl VisitWebpageTool {
    pub fn new(settings: &FetchSettings) -> crate::error::Result<Self> {
        let spec = ToolSpec::new(
            NAME,
            "Fetches the text or HTML content of a given URL. \
             Useful for reading context from news articles or documentation pages.",
        )
        .input(
            "url",
            InputSpec::new("string", "The url of the webpage to visit."),
        );

        Ok(Self {
            spec,
            client: build_http_client(settings.timeout_secs, None)?,
            max_length: settings.max_length,
        })
    }

    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> ToolResult {
        let parsed = url::Url::parse(url)
            .map_err(|e| ToolError::Fetch(format!("Invalid URL '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ToolError::Fetch(format!(
                "Unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                if e.is_timeout() {
                    ToolError::Fetch(
                        "The request timed out. Please try again later or check the URL."
                            .to_string(),
                    )
                } else {
                    ToolError::Fetch(e.to_string())
                }
            })?;

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(true, |ct| ct.contains("html"));

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ToolError::Fetch(format!("Failed to read response body: {}", e)))?;
        debug!("Fetched {} bytes", bytes.len());

        let text = if is_html {
            html2text::from_read(&bytes[..], RENDER_WIDTH)
                .map_err(|e| ToolError::Fetch(format!("Failed to render HTML: {}", e)))?
        } else {
            String::from_utf8_lossy(&bytes).into_owned()
        };

        let text = EXTRA_NEWLINES.replace_all(text.trim(), "\n\n");
        Ok(truncate_content(&text, self.max_length))
    }
}

#[async_trait]
impl Tool for VisitWebpageTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, args: &Arguments) -> ToolResult {
        let url = required_str(args, "url")?;
        self.fetch(url).await
    }
}

/// Keep the head and tail of long content around a truncation notice.
pub fn truncate_content(content: &str, max_length: usize) -> String {
    let total = content.chars().count();
    if total <= max_length {
        return content.to_string();
    }

    let half = max_length / 2;
    let head: String = content.chars().take(half).collect();
    let tail: String = content.chars().skip(total - half).collect();
    format!(
        "{}\n..._This content has been truncated to stay below {} characters_...\n{}",
        head, max_length, tail
    )
}
