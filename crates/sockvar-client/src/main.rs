//! sockvar CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use sockvar_client::cli::{Cli, Command, ConfigAction};
use sockvar_client::commands;
use sockvar_client::config::ClientConfig;
use sockvar_client::error::ClientResult;
use sockvar_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = match cli.command {
        Command::Serve(_) if !cli.debug => TracingConfig::responder(),
        _ => TracingConfig::for_cli(cli.debug),
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = if cli.config.is_some() {
        ClientConfig::load_from(&config_path)?
    } else {
        ClientConfig::load()?
    };

    match cli.command {
        Command::Send(ref args) => commands::send::run(args, &config).await,
        Command::Serve(ref args) => commands::serve::run(args).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}
