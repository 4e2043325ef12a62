//! Devflow CLI entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use devflow_cli::cli::Cli;
use devflow_cli::commands;

#[tokio::main]
async fn main() {
    // Agent CLIs read their API keys from the environment.
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match commands::execute(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
