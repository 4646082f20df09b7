// Quorum multi-agent orchestrator
// Main entry point for the quorum binary

use clap::Parser;
use quorum_engine::cli::{Cli, Command, ConfigAction};
use quorum_engine::config::{expand_path, Config};
use quorum_engine::handlers::{
    handle_ask, handle_config_path, handle_config_show, handle_doctor, handle_run, OutputFormat,
};
use quorum_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config_path = match &cli.config {
        Some(path) => expand_path(path)?,
        None => Config::default_config_path()?,
    };
    let config = if cli.config.is_some() {
        Config::load_from_path(&config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log beats the config file; RUST_LOG beats both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    tracing::info!("Quorum v{}", env!("CARGO_PKG_VERSION"));

    // Handle commands
    match cli.command {
        Command::Run { task, lang, output } => {
            tracing::info!("Routing task: {}", task);
            handle_run(task, lang, output, &config, format).await
        }

        Command::Ask {
            role,
            prompts,
            lang,
            output,
        } => {
            tracing::info!("Asking {} ({} prompt(s))", role, prompts.len());
            handle_ask(role, prompts, lang, output, &config, format).await
        }

        Command::Doctor => {
            tracing::info!("Running diagnostics...");
            handle_doctor(&config, format).await
        }

        Command::Config { action } => {
            tracing::debug!("Config management: {:?}", action);
            match action {
                ConfigAction::Path => handle_config_path(&config_path, format),
                ConfigAction::Show => handle_config_show(&config, format),
                // Loading already validated it
                ConfigAction::Validate => {
                    println!("✓ {} is valid", config_path.display());
                    Ok(())
                }
            }
        }
    }
}
