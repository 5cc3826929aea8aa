//! TLS connector for the provider API
//!
//! Trust roots come from the bundled webpki set, optionally extended with the
//! platform store.

use std::sync::Arc;

use rustls::{ClientConfig, RootCertStore};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use crate::error::{Result, transport};

#[derive(Clone)]
pub struct TlsManager {
    connector: TlsConnector,
}

impl std::fmt::Debug for TlsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsManager").finish_non_exhaustive()
    }
}

impl TlsManager {
    /// Build a connector with webpki roots, plus native roots when requested
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Configuration` if rustls rejects the protocol setup.
    pub fn new(use_native_certs: bool) -> Result<Self> {
        let client_config = create_client_config(use_native_certs)?;
        Ok(Self {
            connector: TlsConnector::from(Arc::new(client_config)),
        })
    }

    /// Run the TLS handshake over an established TCP stream
    ///
    /// # Errors
    ///
    /// Returns `SyncError::ProviderApi` if the host is not a valid server name or
    /// the handshake fails.
    pub async fn connect(&self, host: &str, tcp_stream: TcpStream) -> Result<TlsStream<TcpStream>> {
        let server_name = rustls::pki_types::ServerName::try_from(host.to_string())
            .map_err(|e| transport("tls handshake", format!("Invalid hostname '{host}': {e}")))?;

        let tls_stream = self
            .connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| transport("tls handshake", format!("TLS handshake with {host} failed: {e}")))?;

        tracing::debug!(host = %host, "TLS connection established");
        Ok(tls_stream)
    }
}

fn create_client_config(use_native_certs: bool) -> Result<ClientConfig> {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    if use_native_certs {
        let cert_result = rustls_native_certs::load_native_certs();
        for cert in cert_result.certs {
            if let Err(e) = root_store.add(cert) {
                tracing::warn!("Failed to add system certificate: {}", e);
            }
        }
        for err in &cert_result.errors {
            tracing::warn!("Certificate load error: {}", err);
        }
        tracing::debug!("Root store holds {} certificates", root_store.len());
    }

    let config = ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()
        .map_err(crate::error::configuration)?
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(config)
}
