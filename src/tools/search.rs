//! Web search tools: DuckDuckGo (primary) and Google via SerpAPI (secondary).
//!
//! The two are independent catalog entries. Falling back from one to the
//! other is the orchestrator's decision; neither tool retries the other.

use super::{build_http_client, html_decode, strip_tags};
use crate::config::SearchSettings;
use crate::error::{ToolError, ToolResult};
use crate::registry::{optional_i64, required_str, Arguments, InputSpec, Tool, ToolSpec};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::{debug, instrument};

pub const DUCKDUCKGO_NAME: &str = "web_search";
pub const GOOGLE_NAME: &str = "google_search";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static RESULT_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a\b([^>]*\bclass="result__a"[^>]*)>(.*?)</a>"#).expect("valid regex")
});
static RESULT_SNIPPET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</a>"#).expect("valid regex")
});
static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bhref="([^"]*)""#).expect("valid regex"));

/// One search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// DuckDuckGo search through the HTML endpoint.
pub struct DuckDuckGoSearchTool {
    spec: ToolSpec,
    client: reqwest::Client,
    endpoint: String,
    max_results: usize,
}

impl DuckDuckGoSearchTool {
    pub fn new(settings: &SearchSettings) -> crate::error::Result<Self> {
        let spec = ToolSpec::new(
            DUCKDUCKGO_NAME,
            "Useful for factual questions about general knowledge, history, \
             geography, pop culture, and other encyclopedic information.",
        )
        .input(
            "query",
            InputSpec::new("string", "The search query to perform."),
        );

        Ok(Self {
            spec,
            client: build_http_client(settings.timeout_secs, Some(USER_AGENT))?,
            endpoint: settings.duckduckgo_url.clone(),
            max_results: settings.max_results,
        })
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> ToolResult {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("q", query), ("b", "")])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ToolError::Search(format!("DuckDuckGo request failed: {}", e)))?;

        let html = response
            .text()
            .await
            .map_err(|e| ToolError::Search(format!("Failed to read DuckDuckGo response: {}", e)))?;

        let hits = parse_duckduckgo_html(&html, self.max_results);
        debug!("DuckDuckGo returned {} results", hits.len());

        if hits.is_empty() {
            return Err(ToolError::Search(
                "No results found! Try a less restrictive/shorter query.".to_string(),
            ));
        }

        let body = hits
            .iter()
            .map(|h| format!("[{}]({})\n{}", h.title, h.url, h.snippet))
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(format!("## Search Results\n\n{}", body))
    }
}

#[async_trait]
impl Tool for DuckDuckGoSearchTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, args: &Arguments) -> ToolResult {
        let query = required_str(args, "query")?;
        self.search(query).await
    }
}

/// Parse result blocks out of the DuckDuckGo HTML page.
pub fn parse_duckduckgo_html(html: &str, max_results: usize) -> Vec<SearchHit> {
    let links: Vec<_> = RESULT_LINK.captures_iter(html).collect();
    let mut hits = Vec::new();

    for (i, caps) in links.iter().enumerate() {
        if hits.len() >= max_results {
            break;
        }

        let (Some(whole), Some(attrs), Some(title)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };

        let href = HREF
            .captures(attrs.as_str())
            .and_then(|c| c.get(1))
            .map(|m| html_decode(m.as_str()))
            .unwrap_or_default();
        let url = resolve_redirect(&href);
        let title = strip_tags(title.as_str());

        // The snippet sits between this link and the next one.
        let region_end = links
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(html.len(), |m| m.start());
        let snippet = RESULT_SNIPPET
            .captures(&html[whole.end()..region_end])
            .and_then(|c| c.get(1))
            .map(|m| strip_tags(m.as_str()))
            .unwrap_or_default();

        if !title.is_empty() && !url.is_empty() {
            hits.push(SearchHit {
                title,
                url,
                snippet,
            });
        }
    }

    hits
}

/// DuckDuckGo wraps result links as `//duckduckgo.com/l/?uddg=<encoded>&...`.
fn resolve_redirect(href: &str) -> String {
    let is_absolute = href.starts_with("http://") || href.starts_with("https://");
    if is_absolute && !href.contains("duckduckgo.com/l/") {
        return href.to_string();
    }

    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{}", href)
    } else {
        href.to_string()
    };

    url::Url::parse(&absolute)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or_default()
}

/// Google search through SerpAPI.
pub struct GoogleSearchTool {
    spec: ToolSpec,
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Option<Vec<OrganicResult>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    date: Option<String>,
    source: Option<String>,
    snippet: Option<String>,
}

impl GoogleSearchTool {
    pub fn new(settings: &SearchSettings) -> crate::error::Result<Self> {
        let spec = ToolSpec::new(
            GOOGLE_NAME,
            "Useful as a secondary search source for up-to-date factual queries.",
        )
        .input(
            "query",
            InputSpec::new("string", "The search query to perform."),
        )
        .input(
            "filter_year",
            InputSpec::nullable(
                "integer",
                "Optionally restrict results to a certain year",
            ),
        );

        Ok(Self {
            spec,
            client: build_http_client(settings.timeout_secs, None)?,
            endpoint: settings.serpapi_url.clone(),
            api_key: settings.serpapi_key(),
            max_results: settings.max_results,
        })
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, filter_year: Option<i64>) -> ToolResult {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ToolError::Search(
                "Missing SerpAPI API key. Make sure you have 'SERPAPI_API_KEY' in your env variables."
                    .to_string(),
            )
        })?;

        let mut params = vec![
            ("q", query.to_string()),
            ("api_key", api_key.to_string()),
            ("engine", "google".to_string()),
            ("google_domain", "google.com".to_string()),
        ];
        if let Some(year) = filter_year {
            params.push(("tbs", format!("cdr:1,cd_min:01/01/{year},cd_max:12/31/{year}")));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| ToolError::Search(format!("SerpAPI request failed: {}", e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ToolError::Search(format!("SerpAPI request failed: {}", e)))?;

        if !status.is_success() {
            // Error pages are not always JSON; fall back to the status line.
            let detail = serde_json::from_slice::<SerpApiResponse>(&bytes)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| status.to_string());
            return Err(ToolError::Search(detail));
        }

        let body: SerpApiResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ToolError::Search(format!("Invalid SerpAPI response: {}", e)))?;

        let results = body.organic_results.unwrap_or_default();
        if results.is_empty() {
            let year_note = filter_year
                .map(|y| format!(" with filtering on year={}", y))
                .unwrap_or_default();
            return Err(ToolError::Search(format!(
                "No results found for query: '{}'{}. Use a less restrictive query.",
                query, year_note
            )));
        }

        Ok(format_google_results(&results[..results.len().min(self.max_results)]))
    }
}

fn format_google_results(results: &[OrganicResult]) -> String {
    let entries = results
        .iter()
        .enumerate()
        .map(|(idx, page)| {
            let date = page
                .date
                .as_deref()
                .map(|d| format!("\nDate published: {}", d))
                .unwrap_or_default();
            let source = page
                .source
                .as_deref()
                .map(|s| format!("\nSource: {}", s))
                .unwrap_or_default();
            let snippet = page
                .snippet
                .as_deref()
                .map(|s| format!("\n{}", s))
                .unwrap_or_default();
            format!("{}. [{}]({}){}{}{}", idx, page.title, page.link, date, source, snippet)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("## Search Results\n{}", entries)
}

#[async_trait]
impl Tool for GoogleSearchTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, args: &Arguments) -> ToolResult {
        let query = required_str(args, "query")?;
        let filter_year = optional_i64(args, "filter_year")?;
        self.search(query, filter_year).await
    }
}
