//! Agent Toolbox CLI entry point.

use agent_toolbox::cli::{commands, Cli, Commands};
use agent_toolbox::config::Settings;
use agent_toolbox::registry::Registry;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(config_path.as_path()))?;

    // Logs go to stderr; stdout belongs to command output and the MCP channel.
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            format!("agent_toolbox={},toolbox={}", log_level, log_level)
        })))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match &cli.command {
        Commands::List => {
            let registry = Registry::from_settings(&settings)?;
            commands::run_list(&registry)?;
        }

        Commands::Call { tool, args } => {
            let registry = Registry::from_settings(&settings)?;
            commands::run_call(&registry, tool, args.as_deref()).await?;
        }

        Commands::Smoke {
            short_audio,
            long_audio,
        } => {
            let registry = Registry::from_settings(&settings)?;
            commands::run_smoke(&registry, short_audio, long_audio).await?;
        }

        Commands::Questions => {
            commands::run_questions(&settings).await?;
        }

        Commands::Mcp => {
            commands::run_mcp(&settings).await?;
        }

        Commands::Serve { host, port } => {
            let host = host.clone().unwrap_or_else(|| settings.server.host.clone());
            let port = (*port).unwrap_or(settings.server.port);
            let registry = Registry::from_settings(&settings)?;
            commands::run_serve(&host, port, registry).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, &config_path)?;
        }
    }

    Ok(())
}
