//! Error types for the toolbox.
//!
//! [`ToolError`] is what a tool returns across the invocation boundary. Its
//! `Display` output is the exact text an orchestrator sees when the result is
//! flattened into a string, so the messages here are part of the contract.
//! [`ToolboxError`] covers everything outside a tool call.

use thiserror::Error;

/// Library-level error type for setup, configuration and CLI plumbing.
#[derive(Error, Debug)]
pub enum ToolboxError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scoring API error: {0}")]
    Scoring(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ExternalToolNotFound(String),

    #[error("External tool failed: {0}")]
    ExternalToolFailed(String),
}

/// Result type alias for toolbox operations.
pub type Result<T> = std::result::Result<T, ToolboxError>;

/// Failure categories a caller can branch on without parsing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A file, URL or tool that does not exist or could not be matched.
    NotFound,
    /// A network service, subprocess or parser failed.
    Upstream,
    /// The file extension is not one the reader understands.
    UnsupportedFormat,
    /// Arguments were missing or malformed.
    InvalidInput,
}

/// Error returned by a tool invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Error reading {path}: {message}")]
    Read { path: String, message: String },

    #[error("Invalid YouTube URL.")]
    InvalidVideoUrl,

    #[error("Error fetching transcript: {0}")]
    Transcript(String),

    #[error("Whisper error: {0}")]
    Whisper(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Argument error: {0}")]
    InvalidArguments(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl ToolError {
    /// Map the error onto the coarse failure taxonomy.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ToolError::FileNotFound(_) | ToolError::UnknownTool(_) => ErrorCategory::NotFound,
            ToolError::UnsupportedFileType(_) => ErrorCategory::UnsupportedFormat,
            ToolError::InvalidVideoUrl | ToolError::InvalidArguments(_) => {
                ErrorCategory::InvalidInput
            }
            ToolError::Read { .. }
            | ToolError::Transcript(_)
            | ToolError::Whisper(_)
            | ToolError::Search(_)
            | ToolError::Fetch(_)
            | ToolError::Transcription(_)
            | ToolError::Execution(_)
            | ToolError::Input(_) => ErrorCategory::Upstream,
        }
    }
}

/// Result of a single tool invocation.
pub type ToolResult = std::result::Result<String, ToolError>;
