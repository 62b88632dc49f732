use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use ms_core::AnalysisConfig;
use tracing_subscriber::EnvFilter;

use ms_cli::commands::{analyze, config, normalize};
use ms_cli::{Cli, Commands, load_config};

/// Load and validate configuration.
fn open_config(config_path: Option<&Path>) -> Result<AnalysisConfig> {
    let config = load_config(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Some(Commands::Analyze {
            files,
            date,
            json,
            previous_peak,
        }) => {
            let config = open_config(cli.config.as_deref())?;
            let options = analyze::AnalyzeOptions {
                date: *date,
                json: *json,
                previous_peak: *previous_peak,
            };
            analyze::run(&mut stdout, files, &options, &config)?;
        }
        Some(Commands::Normalize { file }) => {
            let config = open_config(cli.config.as_deref())?;
            let mut stderr = std::io::stderr().lock();
            normalize::run(&mut stdout, &mut stderr, file, &config)?;
        }
        Some(Commands::Config) => {
            let config = open_config(cli.config.as_deref())?;
            config::run(&mut stdout, &config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
