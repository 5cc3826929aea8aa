//! What to synchronize: target names, ports, usages and hashing policy

use crate::error::{Result, invalid_parameter};
use crate::tlsa::{OwnerName, TlsaPolicy, Usage};

/// One create or update invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub domain: String,
    pub subdomain: String,
    pub protocol: String,
    pub ports: Vec<u16>,
    pub usages: Vec<Usage>,
    pub policy: TlsaPolicy,
    /// Update through create-wait-verify-delete instead of in place
    pub rollover: bool,
}

impl SyncRequest {
    /// Request for DANE-EE over TCP with default policy and no ports yet
    #[must_use]
    pub fn new(domain: impl Into<String>, subdomain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            subdomain: subdomain.into(),
            protocol: "tcp".to_string(),
            ports: Vec::new(),
            usages: vec![Usage::DaneEe],
            policy: TlsaPolicy::default(),
            rollover: false,
        }
    }

    #[must_use]
    pub fn with_ports(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.ports = ports.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_usages(mut self, usages: impl IntoIterator<Item = Usage>) -> Self {
        self.usages = usages.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: TlsaPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_rollover(mut self, rollover: bool) -> Self {
        self.rollover = rollover;
        self
    }

    /// # Errors
    ///
    /// Returns `SyncError::InvalidParameter` when no port or usage is requested,
    /// a port is 0, or a name is empty.
    pub fn validate(&self) -> Result<()> {
        if self.ports.is_empty() {
            return Err(invalid_parameter(
                "no ports specified. Use --tcp25, --tcp465, --tcp587 or --tcp-port",
            ));
        }
        if self.ports.contains(&0) {
            return Err(invalid_parameter("port must be between 1 and 65535"));
        }
        if self.usages.is_empty() {
            return Err(invalid_parameter("At least one of DANE-EE or DANE-TA must be enabled"));
        }
        if self.domain.trim().is_empty() {
            return Err(invalid_parameter("domain must not be empty"));
        }
        if self.subdomain.trim().is_empty() {
            return Err(invalid_parameter("subdomain must not be empty"));
        }
        Ok(())
    }

    /// (port, usage) pairs in request order, duplicates removed
    #[must_use]
    pub fn pairs(&self) -> Vec<(u16, Usage)> {
        let mut pairs = Vec::with_capacity(self.ports.len() * self.usages.len());
        for port in &self.ports {
            for usage in &self.usages {
                if !pairs.contains(&(*port, *usage)) {
                    pairs.push((*port, *usage));
                }
            }
        }
        pairs
    }

    /// # Errors
    ///
    /// See [`OwnerName::new`].
    pub fn owner(&self, port: u16) -> Result<OwnerName> {
        OwnerName::new(port, &self.protocol, &self.subdomain, &self.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_ports_rejected() {
        let err = SyncRequest::new("example.com", "mail").validate().unwrap_err();
        assert!(err.to_string().contains("no ports specified"));
    }

    #[test]
    fn test_no_usages_rejected() {
        let err = SyncRequest::new("example.com", "mail")
            .with_ports([25])
            .with_usages([])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("At least one of DANE-EE or DANE-TA must be enabled"));
    }

    #[test]
    fn test_pairs_order_and_dedup() {
        let request = SyncRequest::new("example.com", "mail")
            .with_ports([25, 587, 25])
            .with_usages([Usage::DaneEe, Usage::DaneTa]);
        assert_eq!(
            request.pairs(),
            vec![
                (25, Usage::DaneEe),
                (25, Usage::DaneTa),
                (587, Usage::DaneEe),
                (587, Usage::DaneTa),
            ]
        );
    }

    #[test]
    fn test_owner() {
        let request = SyncRequest::new("example.com", "mail").with_ports([465]);
        assert_eq!(request.owner(465).unwrap().fqdn(), "_465._tcp.mail.example.com");
    }
}
