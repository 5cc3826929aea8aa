//! tlsaflare
//!
//! Publishes DANE TLSA records for a certificate chain on Cloudflare. The
//! command line lives in [`cli`]; [`run`] wires the parsed invocation to the
//! synchronization engine from `tlsaflare_client`.

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

pub use tlsaflare_client::{SyncError, prelude};

use tlsaflare_client::prelude::{
    BatchReport, CertificateChain, CloudflareRepository, PropagationConfig, ProviderConfig, ResolverPanel,
    SyncConfig, SyncEngine,
};

use cli::{Cli, Command};

/// Run one `create` or `update` invocation to completion
///
/// Progress events and the per-pair results are printed to stdout. Logging
/// goes through `tracing`.
///
/// # Errors
///
/// Fails on invalid flags, a missing token, an unreadable certificate file, or
/// when any (port, usage) pair of the batch failed.
pub async fn run(cli: Cli) -> Result<BatchReport> {
    let request = cli.command.sync_request()?;
    let args = cli.command.record_args();

    let token = cli
        .token
        .filter(|t| !t.trim().is_empty())
        .context("Cloudflare API token missing: set TOKEN or pass --token")?;

    let chain = CertificateChain::from_file(&args.cert)
        .with_context(|| format!("Failed to load certificate chain from {}", args.cert.display()))?;

    let repository = CloudflareRepository::new(&ProviderConfig::cloudflare(token))
        .context("Failed to set up the Cloudflare client")?;
    let verifier = ResolverPanel::new(&PropagationConfig::default())
        .context("Failed to set up the propagation resolvers")?;

    let (events, mut received) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = received.recv().await {
            println!("{event}");
        }
    });

    let engine = SyncEngine::new(Arc::new(repository), Arc::new(verifier), SyncConfig::default())
        .with_events(events);
    let report = match &cli.command {
        Command::Create(_) => engine.create(&chain, &request).await,
        Command::Update(_) => engine.update(&chain, &request).await,
    };
    drop(engine);
    if let Err(e) = printer.await {
        tracing::debug!(error = %e, "Event printer stopped early");
    }
    let report = report?;

    for pair in &report.pairs {
        println!("{pair}");
    }
    report
        .ensure_success()
        .context("TLSA synchronization did not complete")?;
    Ok(report)
}
