//! Shared fakes for engine tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use tlsaflare_client::dns::{PropagationReport, PropagationVerifier};
use tlsaflare_client::error::{Result, SyncError, propagation, provider_status};
use tlsaflare_client::provider::{Record, RecordRepository, TlsaData, Zone};
use tlsaflare_client::tls::CertificateChain;
use tlsaflare_client::tlsa::RecordDescriptor;

pub const RSA_FULLCHAIN: &str = include_str!("../fixtures/rsa_fullchain.pem");
pub const RSA_LEAF: &str = include_str!("../fixtures/rsa_leaf.pem");
pub const EC_LEAF: &str = include_str!("../fixtures/ec_leaf.pem");
pub const DSA_LEAF: &str = include_str!("../fixtures/dsa_leaf.pem");

pub fn fullchain() -> CertificateChain {
    CertificateChain::from_pem(RSA_FULLCHAIN.as_bytes()).unwrap()
}

/// Repository call, in the order it was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListZones,
    ListRecords(String),
    Create(String),
    Update(String),
    Delete(String),
}

/// In-memory provider with a call log
#[derive(Debug)]
pub struct MemoryRepository {
    pub zones: Vec<Zone>,
    pub records: Mutex<Vec<Record>>,
    /// Record comment by id, as sent on create and update
    pub comments: Mutex<HashMap<String, String>>,
    pub calls: Mutex<Vec<(Call, Instant)>>,
    pub record_counter: AtomicU64,
    pub fail_on_create: bool,
    pub fail_on_delete: bool,
}

impl MemoryRepository {
    pub fn new(zones: &[(&str, &str)]) -> Self {
        Self {
            zones: zones
                .iter()
                .map(|(id, name)| Zone {
                    id: (*id).to_string(),
                    name: (*name).to_string(),
                })
                .collect(),
            records: Mutex::new(Vec::new()),
            comments: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            record_counter: AtomicU64::new(1),
            fail_on_create: false,
            fail_on_delete: false,
        }
    }

    pub fn example() -> Self {
        Self::new(&[("zone-1", "example.com")])
    }

    pub fn with_failure_on_create(mut self) -> Self {
        self.fail_on_create = true;
        self
    }

    pub fn with_failure_on_delete(mut self) -> Self {
        self.fail_on_delete = true;
        self
    }

    /// Add a TLSA record as if it had been published earlier
    pub fn seed_tlsa(&self, zone_id: &str, name: &str, usage: u8, ttl: u32) -> String {
        let id = format!("seed-{}", self.record_counter.fetch_add(1, Ordering::SeqCst));
        self.records.lock().push(Record {
            id: id.clone(),
            zone_id: zone_id.to_string(),
            name: name.to_string(),
            rr_type: "TLSA".to_string(),
            ttl,
            tlsa: Some(TlsaData {
                usage,
                selector: 1,
                matching_type: 1,
                certificate: "00".repeat(32),
            }),
        });
        id
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().len()
    }

    pub fn record(&self, id: &str) -> Option<Record> {
        self.records.lock().iter().find(|r| r.id == id).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().iter().map(|(c, _)| c.clone()).collect()
    }

    /// Time of the first call matching `pred`
    pub fn call_time(&self, pred: impl Fn(&Call) -> bool) -> Option<Instant> {
        self.calls.lock().iter().find(|(c, _)| pred(c)).map(|(_, at)| *at)
    }

    fn log(&self, call: Call) {
        self.calls.lock().push((call, Instant::now()));
    }

    pub fn comment(&self, id: &str) -> Option<String> {
        self.comments.lock().get(id).cloned()
    }

    fn store(&self, id: &str, zone_id: &str, descriptor: &RecordDescriptor) -> Record {
        self.comments.lock().insert(id.to_string(), descriptor.comment.clone());
        let association = &descriptor.association;
        Record {
            id: id.to_string(),
            zone_id: zone_id.to_string(),
            name: descriptor.owner.fqdn(),
            rr_type: descriptor.rr_type().to_string(),
            ttl: descriptor.ttl,
            tlsa: Some(TlsaData {
                usage: association.usage().value(),
                selector: association.selector().value(),
                matching_type: association.matching_type().value(),
                certificate: association.data().to_string(),
            }),
        }
    }
}

#[async_trait]
impl RecordRepository for MemoryRepository {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.log(Call::ListZones);
        Ok(self.zones.clone())
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<Record>> {
        self.log(Call::ListRecords(zone_id.to_string()));
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|r| r.zone_id == zone_id)
            .cloned()
            .collect())
    }

    async fn create_record(&self, zone_id: &str, descriptor: &RecordDescriptor) -> Result<String> {
        if self.fail_on_create {
            return Err(provider_status("create record", 500, "Mock failure"));
        }
        let id = format!("record-{}", self.record_counter.fetch_add(1, Ordering::SeqCst));
        let record = self.store(&id, zone_id, descriptor);
        self.records.lock().push(record);
        self.log(Call::Create(id.clone()));
        Ok(id)
    }

    async fn update_record(&self, zone_id: &str, record_id: &str, descriptor: &RecordDescriptor) -> Result<()> {
        let record = self.store(record_id, zone_id, descriptor);
        let mut records = self.records.lock();
        let slot = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| provider_status("update record", 404, "Record not found"))?;
        *slot = record;
        drop(records);
        self.log(Call::Update(record_id.to_string()));
        Ok(())
    }

    async fn delete_record(&self, _zone_id: &str, record_id: &str) -> Result<()> {
        self.log(Call::Delete(record_id.to_string()));
        if self.fail_on_delete {
            return Err(provider_status("delete record", 500, "Mock failure"));
        }
        self.records.lock().retain(|r| r.id != record_id);
        Ok(())
    }
}

/// Verifier answering from a switch instead of the network
#[derive(Debug, Default)]
pub struct StubVerifier {
    pub fail: bool,
    pub calls: Mutex<Vec<(String, Instant)>>,
}

impl StubVerifier {
    pub fn passing() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl PropagationVerifier for StubVerifier {
    async fn verify(&self, owner_fqdn: &str) -> Result<PropagationReport> {
        self.calls.lock().push((owner_fqdn.to_string(), Instant::now()));
        if self.fail {
            return Err(propagation(owner_fqdn, "8.8.8.8: request timed out"));
        }
        Ok(PropagationReport {
            owner: owner_fqdn.to_string(),
            answers: Vec::new(),
        })
    }
}

pub fn is_duplicate(error: &SyncError) -> bool {
    matches!(error, SyncError::DuplicateRecord { .. })
}
