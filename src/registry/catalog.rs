//! The fixed tool catalog and the registry that serves it by name.

use super::{render, Arguments, Tool, ToolSpec};
use crate::config::Settings;
use crate::error::{Result, ToolError, ToolResult, ToolboxError};
use crate::openai::create_client;
use crate::tools::{
    DuckDuckGoSearchTool, FileReaderTool, FinalAnswerTool, GoogleSearchTool, Prompter,
    PythonInterpreterTool, SpeechToTextTool, TerminalPrompter, UserInputTool, VisitWebpageTool,
    WhisperTranscriptionTool, YoutubeTranscriptTool,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Every tool the toolbox ships with.
pub enum BuiltinTool {
    PythonInterpreter(PythonInterpreterTool),
    WebSearch(DuckDuckGoSearchTool),
    GoogleSearch(GoogleSearchTool),
    VisitWebpage(VisitWebpageTool),
    Transcriber(SpeechToTextTool),
    YoutubeTranscript(YoutubeTranscriptTool),
    WhisperTranscription(WhisperTranscriptionTool),
    FileReader(FileReaderTool),
    FinalAnswer(FinalAnswerTool),
    UserInput(UserInputTool),
}

impl BuiltinTool {
    fn as_tool(&self) -> &dyn Tool {
        match self {
            Self::PythonInterpreter(t) => t,
            Self::WebSearch(t) => t,
            Self::GoogleSearch(t) => t,
            Self::VisitWebpage(t) => t,
            Self::Transcriber(t) => t,
            Self::YoutubeTranscript(t) => t,
            Self::WhisperTranscription(t) => t,
            Self::FileReader(t) => t,
            Self::FinalAnswer(t) => t,
            Self::UserInput(t) => t,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec().name
    }
}

#[async_trait]
impl Tool for BuiltinTool {
    fn spec(&self) -> &ToolSpec {
        self.as_tool().spec()
    }

    async fn invoke(&self, args: &Arguments) -> ToolResult {
        self.as_tool().invoke(args).await
    }
}

/// Name-addressable collection of tools, in catalog order.
pub struct Registry {
    tools: Vec<BuiltinTool>,
}

impl Registry {
    /// Build a registry, rejecting duplicate tool names.
    pub fn new(tools: Vec<BuiltinTool>) -> Result<Self> {
        for (idx, tool) in tools.iter().enumerate() {
            if tools[..idx].iter().any(|t| t.name() == tool.name()) {
                return Err(ToolboxError::Config(format!(
                    "Duplicate tool name: {}",
                    tool.name()
                )));
            }
        }
        Ok(Self { tools })
    }

    /// The full catalog, prompting on the terminal for `user_input`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::with_prompter(settings, Arc::new(TerminalPrompter))
    }

    /// The full catalog with a custom source of operator answers.
    pub fn with_prompter(settings: &Settings, prompter: Arc<dyn Prompter>) -> Result<Self> {
        let openai = create_client(&settings.openai)?;

        Self::new(vec![
            BuiltinTool::PythonInterpreter(PythonInterpreterTool::new(&settings.code)),
            BuiltinTool::WebSearch(DuckDuckGoSearchTool::new(&settings.search)?),
            BuiltinTool::GoogleSearch(GoogleSearchTool::new(&settings.search)?),
            BuiltinTool::VisitWebpage(VisitWebpageTool::new(&settings.fetch)?),
            BuiltinTool::Transcriber(SpeechToTextTool::new(
                openai.clone(),
                &settings.transcription,
            )),
            BuiltinTool::YoutubeTranscript(YoutubeTranscriptTool::new(&settings.youtube)?),
            BuiltinTool::WhisperTranscription(WhisperTranscriptionTool::new(
                openai,
                &settings.transcription,
                settings.temp_dir(),
            )),
            BuiltinTool::FileReader(FileReaderTool::new()),
            BuiltinTool::FinalAnswer(FinalAnswerTool::new()),
            BuiltinTool::UserInput(UserInputTool::new(prompter)),
        ])
    }

    /// Drop a tool by name. Unknown names leave the registry unchanged.
    pub fn without(mut self, name: &str) -> Self {
        self.tools.retain(|t| t.name() != name);
        self
    }

    pub fn get(&self, name: &str) -> Option<&BuiltinTool> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn specs(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.iter().map(|t| t.spec())
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name.
    #[instrument(skip(self, args))]
    pub async fn invoke(&self, name: &str, args: &Arguments) -> ToolResult {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let result = tool.invoke(args).await;
        if let Err(e) = &result {
            debug!(category = ?e.category(), "Tool returned an error: {}", e);
        }
        result
    }

    /// Invoke a tool and flatten the outcome into the string an orchestrator sees.
    pub async fn call(&self, name: &str, args: &Arguments) -> String {
        render(self.invoke(name, args).await)
    }
}
