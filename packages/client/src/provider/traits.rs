//! Record repository trait and the provider-state types it exchanges
//!
//! Implementations must be thread-safe; the engine calls them concurrently for
//! independent (port, usage) pairs. Nothing returned here is cached between calls.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::{Result, SyncError};
use crate::tlsa::{RR_TYPE, RecordDescriptor, Usage};

/// DNS zone hosted by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

/// TLSA rdata as stored by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsaData {
    pub usage: u8,
    pub selector: u8,
    pub matching_type: u8,
    pub certificate: String,
}

/// Any record of a zone; `tlsa` is set only for TLSA records with readable data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub zone_id: String,
    pub name: String,
    pub rr_type: String,
    pub ttl: u32,
    pub tlsa: Option<TlsaData>,
}

/// Live TLSA record matched to an (owner, usage) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingRecord {
    pub id: String,
    pub zone_id: String,
    pub owner_name: String,
    pub usage: Usage,
    pub ttl: u32,
}

/// Zone and record operations of a DNS-hosting provider
#[async_trait]
pub trait RecordRepository: Send + Sync + Debug {
    /// Provider name for logs (e.g. "cloudflare")
    fn name(&self) -> &'static str;

    async fn list_zones(&self) -> Result<Vec<Zone>>;

    async fn list_records(&self, zone_id: &str) -> Result<Vec<Record>>;

    /// Publish a new record and return its provider id
    async fn create_record(&self, zone_id: &str, descriptor: &RecordDescriptor) -> Result<String>;

    /// Replace the content of an existing record in place
    async fn update_record(&self, zone_id: &str, record_id: &str, descriptor: &RecordDescriptor) -> Result<()>;

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()>;
}

fn normalize(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Pick the zone serving `domain`
///
/// An exact match on the domain wins. Otherwise the longest zone name that is a
/// label suffix of `service_host` is chosen.
///
/// # Errors
///
/// Returns `SyncError::ZoneNotFound` if no zone qualifies.
pub fn select_zone<'a>(domain: &str, service_host: &str, zones: &'a [Zone]) -> Result<&'a Zone> {
    let domain_norm = normalize(domain);
    if let Some(zone) = zones.iter().find(|z| normalize(&z.name) == domain_norm) {
        return Ok(zone);
    }

    let host = normalize(service_host);
    zones
        .iter()
        .filter(|z| {
            let name = normalize(&z.name);
            !name.is_empty() && (host == name || host.ends_with(&format!(".{name}")))
        })
        .max_by_key(|z| normalize(&z.name).len())
        .ok_or_else(|| SyncError::ZoneNotFound {
            domain: domain.to_string(),
        })
}

/// TLSA records of `records` published at `owner_fqdn` with the given usage
#[must_use]
pub fn find_existing(records: &[Record], owner_fqdn: &str, usage: Usage) -> Vec<ExistingRecord> {
    let owner = normalize(owner_fqdn);
    records
        .iter()
        .filter(|r| r.rr_type.eq_ignore_ascii_case(RR_TYPE) && normalize(&r.name) == owner)
        .filter(|r| r.tlsa.as_ref().is_some_and(|d| d.usage == usage.value()))
        .map(|r| ExistingRecord {
            id: r.id.clone(),
            zone_id: r.zone_id.clone(),
            owner_name: r.name.clone(),
            usage,
            ttl: r.ttl,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(id: &str, name: &str) -> Zone {
        Zone {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn tlsa(id: &str, name: &str, usage: u8) -> Record {
        Record {
            id: id.to_string(),
            zone_id: "z1".to_string(),
            name: name.to_string(),
            rr_type: "TLSA".to_string(),
            ttl: 300,
            tlsa: Some(TlsaData {
                usage,
                selector: 1,
                matching_type: 1,
                certificate: "ab".repeat(32),
            }),
        }
    }

    #[test]
    fn test_select_zone_exact() {
        let zones = vec![zone("1", "example.com"), zone("2", "mail.example.com")];
        let selected = select_zone("example.com", "mail.example.com", &zones).unwrap();
        assert_eq!(selected.id, "1");
    }

    #[test]
    fn test_select_zone_longest_suffix() {
        let zones = vec![zone("1", "com"), zone("2", "example.com"), zone("3", "ample.com")];
        let selected = select_zone("shop.example.com", "mail.shop.example.com", &zones).unwrap();
        assert_eq!(selected.id, "2");
    }

    #[test]
    fn test_select_zone_not_found() {
        let zones = vec![zone("1", "example.org")];
        let err = select_zone("example.com", "mail.example.com", &zones).unwrap_err();
        assert!(matches!(err, SyncError::ZoneNotFound { .. }));
    }

    #[test]
    fn test_find_existing_filters_usage_and_type() {
        let mut txt = tlsa("4", "_25._tcp.mail.example.com", 3);
        txt.rr_type = "TXT".to_string();
        txt.tlsa = None;
        let records = vec![
            tlsa("1", "_25._tcp.mail.example.com", 3),
            tlsa("2", "_25._tcp.mail.example.com", 2),
            tlsa("3", "_465._tcp.mail.example.com", 3),
            txt,
        ];
        let found = find_existing(&records, "_25._tcp.mail.example.com", Usage::DaneEe);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "1");
        assert_eq!(found[0].ttl, 300);
    }

    #[test]
    fn test_find_existing_case_insensitive() {
        let records = vec![tlsa("1", "_25._TCP.Mail.Example.com.", 2)];
        assert_eq!(find_existing(&records, "_25._tcp.mail.example.com", Usage::DaneTa).len(), 1);
    }
}
