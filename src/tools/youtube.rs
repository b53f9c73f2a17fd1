//! YouTube transcript tool.
//!
//! Reads the caption track list embedded in the watch page, downloads the
//! chosen timedtext document and joins the segment texts.

use super::{build_http_client, html_decode, strip_tags};
use crate::config::YoutubeSettings;
use crate::error::{ToolError, ToolResult};
use crate::registry::{required_str, Arguments, InputSpec, Tool, ToolSpec};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::{debug, instrument};

pub const NAME: &str = "youtube_transcript";

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v=([A-Za-z0-9_-]+)").expect("valid regex"));
static TEXT_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)").expect("valid regex")
});
static DOCUMENT_ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:transcript|timedtext)\b").expect("valid regex"));
static ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)="([^"]*)""#).expect("valid regex"));

const CAPTION_TRACKS_KEY: &str = "\"captionTracks\":";

/// A caption track advertised by the watch page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `"asr"` for auto-generated tracks.
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// A single timed caption.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

pub struct YoutubeTranscriptTool {
    spec: ToolSpec,
    client: reqwest::Client,
    watch_url: String,
    languages: Vec<String>,
}

impl YoutubeTranscriptTool {
    pub fn new(settings: &YoutubeSettings) -> crate::error::Result<Self> {
        let spec = ToolSpec::new(
            NAME,
            "Fetches the full transcript of a YouTube video from its URL.",
        )
        .input(
            "video_url",
            InputSpec::new(
                "string",
                "Full YouTube watch URL (e.g. https://www.youtube.com/watch?v=...).",
            ),
        );

        Ok(Self {
            spec,
            client: build_http_client(settings.timeout_secs, None)?,
            watch_url: settings.watch_url.clone(),
            languages: settings.languages.clone(),
        })
    }

    /// Fetch the caption segments for a video id, in document order.
    #[instrument(skip(self))]
    pub async fn fetch_segments(&self, video_id: &str) -> Result<Vec<CaptionSegment>, String> {
        let page = self
            .client
            .get(&self.watch_url)
            .query(&[("v", video_id)])
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?
            .text()
            .await
            .map_err(|e| e.to_string())?;

        let tracks = extract_caption_tracks(&page).ok_or_else(|| {
            if page.contains("class=\"g-recaptcha\"") {
                format!("Too many requests while fetching captions for {}", video_id)
            } else {
                format!("Subtitles are disabled for this video ({})", video_id)
            }
        })?;
        debug!("Found {} caption tracks", tracks.len());

        let track = select_track(&tracks, &self.languages).ok_or_else(|| {
            format!(
                "No transcripts were found for any of the requested language codes: {:?}",
                self.languages
            )
        })?;

        let xml = self
            .client
            .get(track.base_url.replace("&fmt=srv3", ""))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?
            .text()
            .await
            .map_err(|e| e.to_string())?;

        parse_timedtext(&xml)
    }
}

#[async_trait]
impl Tool for YoutubeTranscriptTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, args: &Arguments) -> ToolResult {
        let url = required_str(args, "video_url")?;
        let video_id = extract_video_id(url).ok_or(ToolError::InvalidVideoUrl)?;

        let segments = self
            .fetch_segments(&video_id)
            .await
            .map_err(ToolError::Transcript)?;

        Ok(join_segments(&segments))
    }
}

/// Pull the id out of a `v=<id>` query parameter.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Concatenate segment texts with single spaces, keeping their order.
pub fn join_segments(segments: &[CaptionSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Locate and decode the `captionTracks` array inside the watch page.
fn extract_caption_tracks(page: &str) -> Option<Vec<CaptionTrack>> {
    let start = page.find(CAPTION_TRACKS_KEY)? + CAPTION_TRACKS_KEY.len();
    // The array is followed by the rest of the player response; read one value only.
    serde_json::Deserializer::from_str(&page[start..])
        .into_iter::<Vec<CaptionTrack>>()
        .next()?
        .ok()
        .filter(|tracks| !tracks.is_empty())
}

/// For each language in order, prefer a manually created track over a generated one.
fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    languages.iter().find_map(|lang| {
        tracks
            .iter()
            .find(|t| &t.language_code == lang && !t.is_generated())
            .or_else(|| {
                tracks
                    .iter()
                    .find(|t| &t.language_code == lang && t.is_generated())
            })
    })
}

/// Parse a timedtext XML document into segments. Empty elements are dropped.
///
/// A body without a `<transcript>` or `<timedtext>` root is an error.
pub fn parse_timedtext(xml: &str) -> Result<Vec<CaptionSegment>, String> {
    if !DOCUMENT_ROOT.is_match(xml) {
        return Err("no element found: timedtext response is not a transcript".to_string());
    }

    let segments = TEXT_ELEMENT
        .captures_iter(xml)
        .filter_map(|caps| {
            let body = caps.get(2)?.as_str();
            // Caption bodies are XML-escaped HTML, so entities are decoded twice.
            let text = strip_tags(&html_decode(body));
            if text.is_empty() {
                return None;
            }

            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let mut start = 0.0;
            let mut duration = 0.0;
            for attr in ATTRIBUTE.captures_iter(attrs) {
                let value = attr[2].parse::<f64>().unwrap_or(0.0);
                match &attr[1] {
                    "start" => start = value,
                    "dur" => duration = value,
                    _ => {}
                }
            }

            Some(CaptionSegment {
                text,
                start,
                duration,
            })
        })
        .collect();
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEDTEXT: &str = r#"<?xml version="1.0" encoding="utf-8" ?><transcript>
<text start="0.5" dur="2.1">Never gonna</text>
<text start="2.6" dur="1.0"/>
<text start="3.6" dur="1.9">give you &lt;i&gt;up&lt;/i&gt;</text>
<text start="5.5" dur="2">it&amp;#39;s   fine</text>
</transcript>"#;

    fn url_args(url: &str) -> Arguments {
        json!({ "video_url": url }).as_object().cloned().unwrap()
    }

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?feature=share&v=abc_-1&t=10"),
            Some("abc_-1".to_string())
        );
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ"), None);
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn test_parse_timedtext_keeps_order() {
        let segments = parse_timedtext(TIMEDTEXT).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].text, "Never gonna");
        assert_eq!(segments[0].start, 0.5);
        assert_eq!(segments[0].duration, 2.1);
        assert_eq!(segments[1].text, "give you up");
        assert_eq!(segments[2].text, "it's fine");
        assert_eq!(join_segments(&segments), "Never gonna give you up it's fine");
    }

    #[test]
    fn test_parse_timedtext_requires_root() {
        assert!(parse_timedtext("").is_err());
        assert!(parse_timedtext("<html><body>Sorry</body></html>").is_err());
        assert_eq!(parse_timedtext("<transcript></transcript>").unwrap(), vec![]);
        assert_eq!(parse_timedtext("<timedtext format=\"3\"><body/></timedtext>").unwrap(), vec![]);
    }

    #[test]
    fn test_select_track_prefers_manual() {
        let tracks = vec![
            CaptionTrack {
                base_url: "asr".into(),
                language_code: "en".into(),
                kind: Some("asr".into()),
            },
            CaptionTrack {
                base_url: "manual-de".into(),
                language_code: "de".into(),
                kind: None,
            },
            CaptionTrack {
                base_url: "manual-en".into(),
                language_code: "en".into(),
                kind: None,
            },
        ];

        let en = vec!["en".to_string()];
        assert_eq!(select_track(&tracks, &en).unwrap().base_url, "manual-en");

        let de_first = vec!["de".to_string(), "en".to_string()];
        assert_eq!(select_track(&tracks, &de_first).unwrap().base_url, "manual-de");

        let fr = vec!["fr".to_string()];
        assert!(select_track(&tracks, &fr).is_none());
    }

    #[test]
    fn test_extract_caption_tracks() {
        let page = r#"var ytInitialPlayerResponse = {"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://example.com/api/timedtext?v=x&lang=en","languageCode":"en","kind":"asr"}],"audioTracks":[]}}};"#;
        let tracks = extract_caption_tracks(page).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].base_url, "https://example.com/api/timedtext?v=x&lang=en");
        assert!(tracks[0].is_generated());

        assert!(extract_caption_tracks("<html>no captions</html>").is_none());
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let tool = YoutubeTranscriptTool::new(&YoutubeSettings::default()).unwrap();
        let result = tool.invoke(&url_args("https://www.youtube.com/shorts/xyz")).await;
        assert_eq!(crate::registry::render(result), "Invalid YouTube URL.");
    }

    #[tokio::test]
    async fn test_fetches_and_joins_transcript() {
        let server = MockServer::start().await;
        let page = format!(
            r#"<html><script>var r = {{"captions":{{"playerCaptionsTracklistRenderer":{{"captionTracks":[{{"baseUrl":"{}/api/timedtext?v=dQw4w9WgXcQ&lang=en&fmt=srv3","languageCode":"en"}}]}}}}}};</script></html>"#,
            server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/watch"))
            .and(query_param("v", "dQw4w9WgXcQ"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/timedtext"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TIMEDTEXT))
            .mount(&server)
            .await;

        let tool = YoutubeTranscriptTool::new(&YoutubeSettings {
            watch_url: format!("{}/watch", server.uri()),
            ..YoutubeSettings::default()
        })
        .unwrap();

        let out = tool
            .invoke(&url_args("https://www.youtube.com/watch?v=dQw4w9WgXcQ"))
            .await
            .unwrap();
        assert_eq!(out, "Never gonna give you up it's fine");
    }

    #[tokio::test]
    async fn test_empty_caption_body_is_error() {
        let server = MockServer::start().await;
        let page = format!(
            r#"<script>{{"captionTracks":[{{"baseUrl":"{}/api/timedtext?v=abc&lang=en","languageCode":"en"}}]}}</script>"#,
            server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/watch"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/timedtext"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .expect(1)
            .mount(&server)
            .await;

        let tool = YoutubeTranscriptTool::new(&YoutubeSettings {
            watch_url: format!("{}/watch", server.uri()),
            ..YoutubeSettings::default()
        })
        .unwrap();

        let err = tool
            .invoke(&url_args("https://www.youtube.com/watch?v=abc"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Error fetching transcript: no element found"));
    }

    #[tokio::test]
    async fn test_disabled_captions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let tool = YoutubeTranscriptTool::new(&YoutubeSettings {
            watch_url: format!("{}/watch", server.uri()),
            ..YoutubeSettings::default()
        })
        .unwrap();

        let err = tool
            .invoke(&url_args("https://www.youtube.com/watch?v=abc"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error fetching transcript: Subtitles are disabled for this video (abc)"
        );
    }
}
