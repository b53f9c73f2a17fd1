//! Speech-to-text tools backed by the OpenAI transcription API.
//!
//! - `transcriber` sends a short clip in a single request.
//! - `whisper_transcription` handles long recordings: files over the upload
//!   limit are split with ffmpeg and the chunks transcribed concurrently.

use crate::audio::split_audio;
use crate::config::TranscriptionSettings;
use crate::error::{ToolError, ToolResult};
use crate::registry::{required_str, Arguments, InputSpec, Tool, ToolSpec};
use async_openai::config::OpenAIConfig;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

pub const SPEECH_TO_TEXT_NAME: &str = "transcriber";
pub const WHISPER_NAME: &str = "whisper_transcription";

/// Build a transcription request for a local file.
async fn build_request(
    audio_path: &Path,
    model: &str,
) -> Result<async_openai::types::CreateTranscriptionRequest, String> {
    let file_bytes = tokio::fs::read(audio_path)
        .await
        .map_err(|e| format!("Failed to read {}: {}", audio_path.display(), e))?;

    CreateTranscriptionRequestArgs::default()
        .file(AudioInput::from_vec_u8(
            audio_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("audio.mp3")
                .to_string(),
            file_bytes,
        ))
        .model(model)
        .response_format(AudioResponseFormat::Json)
        .build()
        .map_err(|e| format!("Failed to build request: {}", e))
}

/// Short clip transcription in one request.
pub struct SpeechToTextTool {
    spec: ToolSpec,
    client: Client<OpenAIConfig>,
    model: String,
}

impl SpeechToTextTool {
    pub fn new(client: Client<OpenAIConfig>, settings: &TranscriptionSettings) -> Self {
        let spec = ToolSpec::new(
            SPEECH_TO_TEXT_NAME,
            "Converts a short audio snippet (MP3/WAV) to text. \
             Useful for very brief voice notes or clips.",
        )
        .input(
            "audio",
            InputSpec::new("string", "Path to a local audio file to transcribe."),
        );

        Self {
            spec,
            client,
            model: settings.short_model.clone(),
        }
    }

    #[instrument(skip(self), fields(model = %self.model))]
    async fn transcribe(&self, audio_path: &Path) -> Result<String, String> {
        let request = build_request(audio_path, &self.model).await?;
        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| e.to_string())?;
        Ok(response.text.trim().to_string())
    }
}

#[async_trait]
impl Tool for SpeechToTextTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, args: &Arguments) -> ToolResult {
        let audio = required_str(args, "audio")?;
        let path = Path::new(audio);
        if !path.is_file() {
            return Err(ToolError::FileNotFound(audio.to_string()));
        }

        self.transcribe(path).await.map_err(ToolError::Transcription)
    }
}

/// Long recording transcription with Whisper.
pub struct WhisperTranscriptionTool {
    spec: ToolSpec,
    client: Client<OpenAIConfig>,
    model: String,
    max_upload_bytes: u64,
    chunk_duration_seconds: u32,
    max_concurrent_chunks: usize,
    temp_dir: PathBuf,
}

impl WhisperTranscriptionTool {
    pub fn new(
        client: Client<OpenAIConfig>,
        settings: &TranscriptionSettings,
        temp_dir: PathBuf,
    ) -> Self {
        let spec = ToolSpec::new(
            WHISPER_NAME,
            "Transcribes an audio file using OpenAI's Whisper API.",
        )
        .input(
            "audio_file",
            InputSpec::new("string", "Path to a local audio file (mp3 or wav)."),
        );

        Self {
            spec,
            client,
            model: settings.long_model.clone(),
            max_upload_bytes: settings.max_upload_bytes,
            chunk_duration_seconds: settings.chunk_duration_seconds,
            max_concurrent_chunks: settings.max_concurrent_chunks.max(1),
            temp_dir,
        }
    }

    /// Transcribe one file; a reply without a `text` field yields an empty string.
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_single(&self, audio_path: &Path) -> Result<String, String> {
        debug!("Transcribing audio file");
        let request = build_request(audio_path, &self.model).await?;

        let raw = self
            .client
            .audio()
            .transcribe_raw(request)
            .await
            .map_err(|e| e.to_string())?;

        let body: serde_json::Value =
            serde_json::from_slice(&raw).map_err(|e| format!("Invalid response: {}", e))?;

        Ok(body
            .get("text")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string())
    }

    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_chunked(&self, audio_path: &Path) -> Result<String, String> {
        std::fs::create_dir_all(&self.temp_dir).map_err(|e| e.to_string())?;
        let scratch = tempfile::Builder::new()
            .prefix("whisper-")
            .tempdir_in(&self.temp_dir)
            .map_err(|e| e.to_string())?;

        let chunks = split_audio(
            audio_path,
            scratch.path(),
            self.chunk_duration_seconds,
            self.max_upload_bytes,
        )
        .await
        .map_err(|e| e.to_string())?;
        info!("Transcribing {} chunks with {}", chunks.len(), self.model);

        let chunk_paths: Vec<(usize, std::path::PathBuf)> = chunks
            .iter()
            .enumerate()
            .map(|(idx, chunk)| (idx, chunk.path.clone()))
            .collect();
        let mut results: Vec<(usize, Result<String, String>)> =
            stream::iter(chunk_paths)
                .map(|(idx, chunk_path)| async move {
                    (idx, self.transcribe_single(&chunk_path).await)
                })
                .buffer_unordered(self.max_concurrent_chunks)
                .collect()
                .await;

        results.sort_by_key(|(idx, _)| *idx);

        let mut texts = Vec::with_capacity(results.len());
        for (idx, result) in results {
            let text = result.map_err(|e| {
                let offset = chunks.get(idx).map_or(0.0, |c| c.offset_seconds);
                format!("Chunk {} at {:.0}s failed: {}", idx, offset, e)
            })?;
            let text = text.trim();
            if !text.is_empty() {
                texts.push(text.to_string());
            }
        }

        Ok(texts.join(" "))
    }
}

#[async_trait]
impl Tool for WhisperTranscriptionTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, args: &Arguments) -> ToolResult {
        let audio_file = required_str(args, "audio_file")?;
        let path = Path::new(audio_file);
        if !path.is_file() {
            return Err(ToolError::FileNotFound(audio_file.to_string()));
        }

        let size = std::fs::metadata(path)
            .map_err(|e| ToolError::Whisper(e.to_string()))?
            .len();

        let result = if size > self.max_upload_bytes {
            self.transcribe_chunked(path).await
        } else {
            self.transcribe_single(path).await
        };

        result.map_err(ToolError::Whisper)
    }
}
