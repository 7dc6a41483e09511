use clap::Parser;
use owo_colors::OwoColorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    // Protocol messages own stdout; diagnostics go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sheetfeed_cli=info,sheetfeed_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Spec => commands::spec::run(),
        Commands::Check { config } => commands::check::run(config).await,
        Commands::Discover { config } => commands::discover::run(config).await,
        Commands::Read { config, catalog } => commands::read::run(config, catalog).await,
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        process::exit(1);
    }
}
