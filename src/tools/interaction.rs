//! Tools that talk to the people around the agent: the final answer handed
//! back to the grader and questions asked of the operator.

use crate::error::{ToolError, ToolResult};
use crate::registry::{required_str, Arguments, InputSpec, Tool, ToolSpec};
use async_trait::async_trait;
use console::Term;
use serde_json::Value;
use std::io::BufRead;
use std::sync::Arc;

pub const FINAL_ANSWER_NAME: &str = "final_answer";
pub const USER_INPUT_NAME: &str = "user_input";

/// Passes the agent's answer through unchanged.
pub struct FinalAnswerTool {
    spec: ToolSpec,
}

impl FinalAnswerTool {
    pub fn new() -> Self {
        let spec = ToolSpec::new(
            FINAL_ANSWER_NAME,
            "Wraps the final answer string for submission without extra explanation.",
        )
        .input(
            "answer",
            InputSpec::new("any", "The final answer to the problem"),
        );

        Self { spec }
    }
}

impl Default for FinalAnswerTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FinalAnswerTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, args: &Arguments) -> ToolResult {
        match args.get("answer") {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Ok(other.to_string()),
            None => Err(ToolError::InvalidArguments(
                "Missing 'answer' argument".to_string(),
            )),
        }
    }
}

/// Source of operator answers.
pub trait Prompter: Send + Sync {
    /// Show `message` and return the reply without its trailing newline.
    fn prompt(&self, message: &str) -> std::io::Result<String>;
}

/// Prompts on the controlling terminal, falling back to plain stdin when
/// input is piped.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt(&self, message: &str) -> std::io::Result<String> {
        let term = Term::stdout();
        term.write_str(message)?;
        term.flush()?;

        if term.is_term() {
            return term.read_line();
        }

        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "EOF when reading a line",
            ));
        }
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }
}

/// Asks the operator a question and returns the typed answer.
pub struct UserInputTool {
    spec: ToolSpec,
    prompter: Arc<dyn Prompter>,
}

impl UserInputTool {
    pub fn new(prompter: Arc<dyn Prompter>) -> Self {
        let spec = ToolSpec::new(
            USER_INPUT_NAME,
            "Asks for user's input on a specific question",
        )
        .input(
            "question",
            InputSpec::new("string", "The question to ask the user"),
        );

        Self { spec, prompter }
    }
}

#[async_trait]
impl Tool for UserInputTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, args: &Arguments) -> ToolResult {
        let question = required_str(args, "question")?;
        let message = format!("{} => Type your answer here:", question);
        let prompter = Arc::clone(&self.prompter);

        tokio::task::spawn_blocking(move || prompter.prompt(&message))
            .await
            .map_err(|e| ToolError::Input(e.to_string()))?
            .map_err(|e| ToolError::Input(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replays canned answers and records what was asked.
    struct ScriptedPrompter {
        answers: Mutex<Vec<String>>,
        asked: Mutex<Vec<String>>,
    }

    impl ScriptedPrompter {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: Mutex::new(answers.iter().rev().map(|s| s.to_string()).collect()),
                asked: Mutex::new(Vec::new()),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn prompt(&self, message: &str) -> std::io::Result<String> {
            self.asked.lock().unwrap().push(message.to_string());
            self.answers.lock().unwrap().pop().ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "no more answers")
            })
        }
    }

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_final_answer_passes_strings_through() {
        let tool = FinalAnswerTool::new();
        let out = tool
            .invoke(&args(json!({ "answer": "Paris, France" })))
            .await
            .unwrap();
        assert_eq!(out, "Paris, France");
    }

    #[tokio::test]
    async fn test_final_answer_serializes_other_values() {
        let tool = FinalAnswerTool::new();
        assert_eq!(tool.invoke(&args(json!({ "answer": 42 }))).await.unwrap(), "42");
        assert_eq!(
            tool.invoke(&args(json!({ "answer": ["a", 1] }))).await.unwrap(),
            "[\"a\",1]"
        );
        assert!(matches!(
            tool.invoke(&Arguments::new()).await,
            Err(ToolError::InvalidArguments(_))
        ));
    }

    #[tokio::test]
    async fn test_user_input_prompt_format() {
        let prompter = Arc::new(ScriptedPrompter::new(&["blue"]));
        let tool = UserInputTool::new(prompter.clone());

        let out = tool
            .invoke(&args(json!({ "question": "Favourite colour?" })))
            .await
            .unwrap();
        assert_eq!(out, "blue");
        assert_eq!(
            prompter.asked.lock().unwrap().as_slice(),
            ["Favourite colour? => Type your answer here:"]
        );
    }

    #[tokio::test]
    async fn test_user_input_eof_is_input_error() {
        let tool = UserInputTool::new(Arc::new(ScriptedPrompter::new(&[])));
        let err = tool
            .invoke(&args(json!({ "question": "Anyone there?" })))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Input error: no more answers");
    }
}
