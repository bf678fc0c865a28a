use anyhow::Result;
use clap::Parser;
use remedy_cli::commands;
use remedy_cli::config::Cli;

fn main() -> Result<()> {
    // stdout carries command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::run(cli)
}
