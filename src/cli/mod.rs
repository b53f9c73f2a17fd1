//! CLI module for the toolbox.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Agent Toolbox - pre-built tools for an orchestrating agent
///
/// Code execution, web search, page fetching, transcription, file reading and
/// operator prompts behind one name-plus-arguments calling convention.
#[derive(Parser, Debug)]
#[command(name = "toolbox")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TOOLBOX_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every tool with its description and inputs
    List,

    /// Invoke one tool and print its output
    Call {
        /// Tool name (see `toolbox list`)
        tool: String,

        /// Arguments as a JSON object, e.g. '{"query": "rust"}'
        #[arg(short, long)]
        args: Option<String>,
    },

    /// Run every tool once against fixed sample inputs
    Smoke {
        /// Short audio clip for the transcriber
        #[arg(long, default_value = "sample_short.wav")]
        short_audio: String,

        /// Long recording for Whisper transcription
        #[arg(long, default_value = "sample_long.mp3")]
        long_audio: String,
    },

    /// Fetch the question list from the scoring API
    Questions,

    /// Start MCP server for AI assistant integration (stdio)
    Mcp,

    /// Start HTTP API server exposing the tools
    Serve {
        /// Host to bind to (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value (e.g. `search.max_results 5`)
    Set {
        /// Dotted configuration key
        key: String,
        /// Value, parsed as a TOML literal when possible
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call() {
        let cli = Cli::try_parse_from([
            "toolbox",
            "-vv",
            "call",
            "web_search",
            "--args",
            r#"{"query": "rust"}"#,
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Call { tool, args } => {
                assert_eq!(tool, "web_search");
                assert_eq!(args.as_deref(), Some(r#"{"query": "rust"}"#));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_smoke_defaults() {
        let cli = Cli::try_parse_from(["toolbox", "smoke"]).unwrap();
        match cli.command {
            Commands::Smoke {
                short_audio,
                long_audio,
            } => {
                assert_eq!(short_audio, "sample_short.wav");
                assert_eq!(long_audio, "sample_long.mp3");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_config_set() {
        let cli = Cli::try_parse_from(["toolbox", "config", "set", "server.port", "8080"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Set { .. }
            }
        ));
    }
}
