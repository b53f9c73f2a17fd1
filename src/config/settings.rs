//! Configuration settings for the toolbox.

use crate::error::{Result, ToolboxError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub openai: OpenAiSettings,
    pub code: CodeSettings,
    pub search: SearchSettings,
    pub fetch: FetchSettings,
    pub transcription: TranscriptionSettings,
    pub youtube: YoutubeSettings,
    pub scoring: ScoringSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary files (audio chunks).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/agent-toolbox".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// OpenAI client settings. The API key is always read from `OPENAI_API_KEY`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    /// Alternative API base (for proxies and compatible servers).
    pub api_base: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_base: None,
            timeout_secs: 300,
        }
    }
}

/// Code execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeSettings {
    /// Interpreter binary.
    pub interpreter: String,
    /// Arguments placed before the script path.
    pub args: Vec<String>,
    /// Wall-clock limit for a single snippet.
    pub timeout_secs: u64,
}

impl Default for CodeSettings {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            args: vec!["-I".to_string()],
            timeout_secs: 30,
        }
    }
}

/// Web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Maximum number of results returned by a search tool.
    pub max_results: usize,
    /// DuckDuckGo HTML endpoint.
    pub duckduckgo_url: String,
    /// SerpAPI search endpoint.
    pub serpapi_url: String,
    /// SerpAPI key. Falls back to `SERPAPI_API_KEY` when unset.
    pub serpapi_api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: 10,
            duckduckgo_url: "https://html.duckduckgo.com/html/".to_string(),
            serpapi_url: "https://serpapi.com/search.json".to_string(),
            serpapi_api_key: None,
            timeout_secs: 15,
        }
    }
}

impl SearchSettings {
    /// Resolve the SerpAPI key from config or environment.
    pub fn serpapi_key(&self) -> Option<String> {
        self.serpapi_api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("SERPAPI_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

/// Webpage fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum characters returned for a page.
    pub max_length: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            max_length: 40_000,
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Model for short clips (single request).
    pub short_model: String,
    /// Model for long recordings.
    pub long_model: String,
    /// Files larger than this are split before upload.
    pub max_upload_bytes: u64,
    /// Duration in seconds of each split chunk.
    pub chunk_duration_seconds: u32,
    /// Maximum concurrent chunk uploads.
    pub max_concurrent_chunks: usize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            short_model: "gpt-4o-mini-transcribe".to_string(),
            long_model: "whisper-1".to_string(),
            max_upload_bytes: 25 * 1024 * 1024,
            chunk_duration_seconds: 600,
            max_concurrent_chunks: 3,
        }
    }
}

/// YouTube caption settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// Watch page base URL; the video id is appended as `?v=<id>`.
    pub watch_url: String,
    /// Preferred caption languages, in order.
    pub languages: Vec<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            watch_url: "https://www.youtube.com/watch".to_string(),
            languages: vec!["en".to_string()],
            timeout_secs: 15,
        }
    }
}

/// Evaluation API settings used by the `questions` probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            api_url: "https://agents-course-unit4-scoring.hf.space".to_string(),
            timeout_secs: 15,
        }
    }
}

/// HTTP server defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ToolboxError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agent-toolbox")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Return a copy with the dotted `key` set to `value`.
    ///
    /// The value is parsed as a TOML literal when possible (numbers, booleans,
    /// arrays) and taken as a plain string otherwise. The result is validated
    /// by deserializing it back into [`Settings`].
    pub fn with_value(&self, key: &str, value: &str) -> Result<Self> {
        let mut root = toml::Value::try_from(self)
            .map_err(|e| ToolboxError::Config(format!("Failed to serialize config: {}", e)))?;

        let parsed = parse_toml_literal(value);

        let mut parts = key.split('.').peekable();
        let mut node = &mut root;
        while let Some(part) = parts.next() {
            let table = node
                .as_table_mut()
                .ok_or_else(|| ToolboxError::Config(format!("'{}' is not a section", key)))?;

            if parts.peek().is_none() {
                if !table.contains_key(part) && !is_optional_key(key) {
                    return Err(ToolboxError::Config(format!("Unknown config key: {}", key)));
                }
                table.insert(part.to_string(), parsed);
                break;
            }

            node = table
                .get_mut(part)
                .ok_or_else(|| ToolboxError::Config(format!("Unknown config section: {}", part)))?;
        }

        let updated: Settings = root
            .try_into()
            .map_err(|e: toml::de::Error| ToolboxError::Config(e.to_string()))?;
        Ok(updated)
    }
}

/// Keys whose default is `None` and therefore absent from the serialized tree.
fn is_optional_key(key: &str) -> bool {
    matches!(key, "openai.api_base" | "search.serpapi_api_key")
}

fn parse_toml_literal(value: &str) -> toml::Value {
    let wrapped = format!("v = {}", value);
    toml::from_str::<toml::Table>(&wrapped)
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.code.interpreter, "python3");
        assert_eq!(settings.fetch.max_length, 40_000);
        assert_eq!(settings.scoring.timeout_secs, 15);
        assert_eq!(settings.youtube.languages, vec!["en".to_string()]);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [search]
            max_results = 3
            "#,
        )
        .unwrap();
        assert_eq!(settings.search.max_results, 3);
        assert_eq!(settings.search.timeout_secs, 15);
        assert_eq!(settings.transcription.long_model, "whisper-1");
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(Some(dir.path().join("absent.toml").as_path())).unwrap();
        assert_eq!(settings.server.port, 3000);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut settings = Settings::default();
        settings.code.timeout_secs = 5;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(path.as_path())).unwrap();
        assert_eq!(loaded.code.timeout_secs, 5);
    }

    #[test]
    fn test_with_value() {
        let settings = Settings::default();

        let updated = settings.with_value("search.max_results", "4").unwrap();
        assert_eq!(updated.search.max_results, 4);

        let updated = settings.with_value("code.interpreter", "python3.12").unwrap();
        assert_eq!(updated.code.interpreter, "python3.12");

        let updated = settings
            .with_value("youtube.languages", r#"["de", "en"]"#)
            .unwrap();
        assert_eq!(updated.youtube.languages, vec!["de", "en"]);

        let updated = settings
            .with_value("openai.api_base", "http://localhost:8080/v1")
            .unwrap();
        assert_eq!(
            updated.openai.api_base.as_deref(),
            Some("http://localhost:8080/v1")
        );
    }

    #[test]
    fn test_with_value_rejects_bad_input() {
        let settings = Settings::default();
        assert!(settings.with_value("search.nope", "1").is_err());
        assert!(settings.with_value("nope.key", "1").is_err());
        assert!(settings.with_value("server.port", "not-a-port").is_err());
    }
}
