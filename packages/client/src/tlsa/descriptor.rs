//! Record descriptors: everything the provider needs to publish one TLSA record

use std::fmt;

use chrono::Local;

use super::hasher::associate;
use super::types::{Association, TlsaPolicy, Usage};
use crate::config::SyncConfig;
use crate::error::{Result, invalid_parameter};
use crate::tls::CertificateChain;

/// Resource record type written for every descriptor
pub const RR_TYPE: &str = "TLSA";

/// Marker written into the record comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Created,
    Updated,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Created => f.write_str("Created"),
            Action::Updated => f.write_str("Updated"),
        }
    }
}

/// Owner name of a TLSA RRset, `_<port>._<protocol>.<subdomain>.<domain>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerName {
    port: u16,
    protocol: String,
    subdomain: String,
    domain: String,
}

impl OwnerName {
    /// # Errors
    ///
    /// Returns `SyncError::InvalidParameter` for port 0 or an empty label.
    pub fn new(port: u16, protocol: &str, subdomain: &str, domain: &str) -> Result<Self> {
        if port == 0 {
            return Err(invalid_parameter("port must be between 1 and 65535"));
        }
        let protocol = protocol.trim().to_ascii_lowercase();
        let subdomain = subdomain.trim().trim_end_matches('.').to_ascii_lowercase();
        let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
        if protocol.is_empty() || subdomain.is_empty() || domain.is_empty() {
            return Err(invalid_parameter("protocol, subdomain and domain must not be empty"));
        }
        Ok(Self {
            port,
            protocol,
            subdomain,
            domain,
        })
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Name relative to the domain, e.g. `_25._tcp.mail`
    #[must_use]
    pub fn relative(&self) -> String {
        format!("_{}._{}.{}", self.port, self.protocol, self.subdomain)
    }

    /// Absolute name without trailing dot, e.g. `_25._tcp.mail.example.com`
    #[must_use]
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.relative(), self.domain)
    }

    /// Host the service runs on, `<subdomain>.<domain>`
    #[must_use]
    pub fn service_host(&self) -> String {
        format!("{}.{}", self.subdomain, self.domain)
    }
}

impl fmt::Display for OwnerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fqdn())
    }
}

/// Immutable description of one TLSA record to create or update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDescriptor {
    pub owner: OwnerName,
    pub ttl: u32,
    pub priority: u16,
    pub proxied: bool,
    pub comment: String,
    pub association: Association,
}

impl RecordDescriptor {
    /// Hash the chain for `usage` and assemble the descriptor
    ///
    /// The policy is already range-checked by its constructor, so hashing is the
    /// only step that can still fail.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UnsupportedKeyType` or `SyncError::CertificateParse`
    /// from the hasher.
    pub fn build(
        chain: &CertificateChain,
        owner: OwnerName,
        usage: Usage,
        policy: TlsaPolicy,
        action: Action,
        config: &SyncConfig,
    ) -> Result<Self> {
        let selector = policy.selector.resolve(usage);
        let association = associate(chain, usage, selector, policy.matching_type)?;
        Ok(Self {
            owner,
            ttl: config.default_ttl,
            priority: config.priority,
            proxied: false,
            comment: comment(action, &config.comment_tag),
            association,
        })
    }

    #[must_use]
    pub fn rr_type(&self) -> &'static str {
        RR_TYPE
    }

    #[must_use]
    pub fn usage(&self) -> Usage {
        self.association.usage()
    }
}

/// `<Action> by <tag> - <YYYY-MM-DD HH:MM:SS>` in local time
#[must_use]
pub fn comment(action: Action, tag: &str) -> String {
    format!("{action} by {tag} - {}", Local::now().format("%Y-%m-%d %H:%M:%S"))
}
