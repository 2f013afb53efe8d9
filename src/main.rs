//! shellcache - offline response cache manager
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use shellcache::cli::{Cli, Commands, Host};
use shellcache::config::ConfigManager;
use shellcache::error::ShellResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, log_format: &str) {
    // 0 = warn, 1 = info, 2+ = debug
    let filter = match verbose {
        0 => EnvFilter::new("shellcache=warn"),
        1 => EnvFilter::new("shellcache=info"),
        _ => EnvFilter::new("shellcache=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

async fn run() -> ShellResult<()> {
    let cli = Cli::parse();

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config.general.log_format);
    debug!("Using config {}", config_manager.path().display());

    // Config command doesn't need a worker
    if let Commands::Config(args) = cli.command {
        return shellcache::cli::commands::config(args, &config_manager, &config).await;
    }

    let state_dir = cli
        .state_dir
        .clone()
        .unwrap_or_else(ConfigManager::state_dir);
    let host = Host::open(&config, &state_dir).await?;

    let result = match cli.command {
        Commands::Config(_) => unreachable!("Config handled above"),
        Commands::Install => shellcache::cli::commands::install(&host).await,
        Commands::Activate => shellcache::cli::commands::activate(&host).await,
        Commands::Fetch(args) => shellcache::cli::commands::fetch(args, &host).await,
        Commands::Message(args) => shellcache::cli::commands::message(args, &host).await,
        Commands::Sync(args) => shellcache::cli::commands::sync(args, &host).await,
        Commands::List(args) => shellcache::cli::commands::list(args, &host).await,
        Commands::Status => shellcache::cli::commands::status(&host).await,
    };

    // Lifecycle changes persist even when the command itself failed
    host.persist().await?;
    result
}
