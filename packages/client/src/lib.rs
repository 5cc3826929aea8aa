//! # tlsaflare client
//!
//! Keeps DANE/TLSA records in a DNS-hosting provider in step with an X.509
//! certificate chain.
//!
//! ## Features
//!
//! - **Association data** for DANE-EE (3) and DANE-TA (2) with selector 0/1 and
//!   SHA-256/SHA-512 matching
//! - **Create** records without ever publishing a duplicate per (owner, usage)
//! - **Update** in place, or **roll over** safely: publish the new record, wait
//!   twice the old TTL, check a resolver panel, then delete the old record
//! - **Cloudflare v4** repository over hyper and rustls
//! - **Progress events** on an optional channel
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tlsaflare_client::prelude::*;
//!
//! # async fn run() -> tlsaflare_client::Result<()> {
//! let chain = CertificateChain::from_file("/etc/ssl/mail/fullchain.pem")?;
//! let repository = CloudflareRepository::new(&ProviderConfig::cloudflare("api-token"))?;
//! let verifier = ResolverPanel::new(&PropagationConfig::default())?;
//! let engine = SyncEngine::new(Arc::new(repository), Arc::new(verifier), SyncConfig::default());
//!
//! let request = SyncRequest::new("example.com", "mail").with_ports([25, 587]);
//! let report = engine.create(&chain, &request).await?;
//! report.ensure_success()?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod dns;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod sync;
pub mod tls;
pub mod tlsa;

pub use error::{Result, SyncError};
