use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tlsaflare::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Starting tlsaflare");

    match tlsaflare::run(cli).await {
        Ok(report) => {
            tracing::info!(pairs = report.pairs.len(), "All TLSA records synchronized");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
