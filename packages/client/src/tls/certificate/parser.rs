//! PEM certificate chain loading
//!
//! The first certificate block is the end-entity and must parse. Later blocks are
//! walked best-effort: a block whose DER does not decode is skipped, and a PEM
//! framing error ends the walk with whatever was collected so far. Private keys
//! and other non-certificate blocks are ignored.

use std::path::Path;

use der::Decode;
use rustls::pki_types::CertificateDer;
use rustls_pemfile::Item;
use x509_cert::Certificate;

use crate::error::{Result, certificate_parse};
use crate::tlsa::Usage;

/// One certificate of a chain, kept both as raw DER and parsed
#[derive(Debug, Clone)]
pub struct ChainCertificate {
    der: CertificateDer<'static>,
    parsed: Certificate,
}

impl ChainCertificate {
    /// Raw DER exactly as it appeared in the PEM input
    #[must_use]
    pub fn der(&self) -> &[u8] {
        self.der.as_ref()
    }

    #[must_use]
    pub fn parsed(&self) -> &Certificate {
        &self.parsed
    }

    #[must_use]
    pub fn subject(&self) -> String {
        self.parsed.tbs_certificate.subject.to_string()
    }
}

/// Ordered certificate chain, end-entity first
#[derive(Debug, Clone)]
pub struct CertificateChain {
    entries: Vec<ChainCertificate>,
}

impl CertificateChain {
    /// Parse a chain from PEM bytes
    ///
    /// # Errors
    ///
    /// Returns `SyncError::CertificateParse` when the input contains no
    /// certificate block or the first certificate is malformed.
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let mut reader = std::io::BufReader::new(pem);
        let mut entries: Vec<ChainCertificate> = Vec::new();

        loop {
            let item = match rustls_pemfile::read_one(&mut reader) {
                Ok(Some(item)) => item,
                Ok(None) => break,
                Err(e) if entries.is_empty() => {
                    return Err(certificate_parse(format!("Failed to parse PEM: {e:?}")));
                }
                Err(e) => {
                    tracing::debug!(error = ?e, parsed = entries.len(), "Stopping chain walk at malformed PEM");
                    break;
                }
            };

            let Item::X509Certificate(der) = item else {
                continue;
            };

            match Certificate::from_der(der.as_ref()) {
                Ok(parsed) => entries.push(ChainCertificate { der, parsed }),
                Err(e) if entries.is_empty() => {
                    return Err(certificate_parse(format!("X.509 parsing failed: {e}")));
                }
                Err(e) => {
                    tracing::debug!(error = %e, index = entries.len(), "Skipping undecodable chain certificate");
                }
            }
        }

        if entries.is_empty() {
            return Err(certificate_parse("No certificate in PEM data"));
        }

        tracing::debug!(
            certificates = entries.len(),
            subject = %entries[0].subject(),
            "Loaded certificate chain"
        );
        Ok(Self { entries })
    }

    /// Read and parse a PEM chain file
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Io` if the file cannot be read, otherwise see
    /// [`CertificateChain::from_pem`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let pem = std::fs::read(path.as_ref())?;
        Self::from_pem(&pem)
    }

    #[must_use]
    pub fn end_entity(&self) -> &ChainCertificate {
        &self.entries[0]
    }

    /// Last certificate of the chain; the leaf itself for a one-certificate chain
    #[must_use]
    pub fn trust_anchor(&self) -> &ChainCertificate {
        &self.entries[self.entries.len() - 1]
    }

    /// Certificate whose data a record of the given usage publishes
    #[must_use]
    pub fn for_usage(&self, usage: Usage) -> &ChainCertificate {
        match usage {
            Usage::DaneEe => self.end_entity(),
            Usage::DaneTa => self.trust_anchor(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; a chain holds at least the end-entity
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainCertificate> {
        self.entries.iter()
    }
}
