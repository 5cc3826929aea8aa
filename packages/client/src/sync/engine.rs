//! Create / update / rollover decisions for every (port, usage) pair of a request
//!
//! Pairs run as concurrent futures on the calling task and never share state, so
//! one failing pair does not stop the others. Provider state is listed fresh for
//! each pair.

use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::events::{EventSender, SyncEvent, emit};
use super::report::{BatchReport, InPhase, PairFailure, PairReport, PairStatus, Phase};
use super::request::SyncRequest;
use super::rollover::{RolloverPlan, spawn_rollover};
use crate::config::SyncConfig;
use crate::dns::PropagationVerifier;
use crate::error::{Result, SyncError};
use crate::provider::{ExistingRecord, RecordRepository, Zone, find_existing, select_zone};
use crate::tls::CertificateChain;
use crate::tlsa::{Action, OwnerName, RecordDescriptor, Usage};

type PairResult = std::result::Result<PairStatus, PairFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Create,
    Update,
}

#[derive(Debug, Clone)]
pub struct SyncEngine {
    repository: Arc<dyn RecordRepository>,
    verifier: Arc<dyn PropagationVerifier>,
    config: SyncConfig,
    events: Option<EventSender>,
    cancel: CancellationToken,
}

impl SyncEngine {
    #[must_use]
    pub fn new(
        repository: Arc<dyn RecordRepository>,
        verifier: Arc<dyn PropagationVerifier>,
        config: SyncConfig,
    ) -> Self {
        Self {
            repository,
            verifier,
            config,
            events: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Publish progress on `events`
    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Rollover tasks get child tokens of `cancel`
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Create a record for every pair that does not have one yet
    ///
    /// # Errors
    ///
    /// Returns an error only if the request itself is invalid; per-pair failures
    /// are reported in the returned [`BatchReport`].
    pub async fn create(&self, chain: &CertificateChain, request: &SyncRequest) -> Result<BatchReport> {
        self.run_batch(chain, request, Mode::Create).await
    }

    /// Update every pair in place, or through a rollover when requested
    ///
    /// # Errors
    ///
    /// Returns an error only if the request itself is invalid; per-pair failures
    /// are reported in the returned [`BatchReport`].
    pub async fn update(&self, chain: &CertificateChain, request: &SyncRequest) -> Result<BatchReport> {
        self.run_batch(chain, request, Mode::Update).await
    }

    async fn run_batch(&self, chain: &CertificateChain, request: &SyncRequest, mode: Mode) -> Result<BatchReport> {
        self.config.validate().map_err(crate::error::configuration)?;
        request.validate()?;

        let pairs = request.pairs();
        info!(
            provider = self.repository.name(),
            pairs = pairs.len(),
            rollover = request.rollover,
            "Synchronizing TLSA records"
        );

        let reports = join_all(
            pairs
                .iter()
                .map(|(port, usage)| self.run_pair(chain, request, *port, *usage, mode)),
        )
        .await;

        let batch = BatchReport::new(reports);
        for failure in batch.failures() {
            warn!(owner = %failure.owner, usage = %failure.usage, "TLSA operation failed");
        }
        Ok(batch)
    }

    async fn run_pair(&self, chain: &CertificateChain, request: &SyncRequest, port: u16, usage: Usage, mode: Mode) -> PairReport {
        let owner = match request.owner(port) {
            Ok(owner) => owner,
            Err(error) => {
                return PairReport {
                    port,
                    usage,
                    owner: format!("_{port}._{}.{}", request.protocol, request.subdomain),
                    outcome: Err(PairFailure {
                        phase: Phase::Describe,
                        error,
                    }),
                };
            }
        };

        let outcome = match mode {
            Mode::Create => self.create_pair(chain, request, &owner, usage).await,
            Mode::Update if request.rollover => self.rollover_pair(chain, request, &owner, usage).await,
            Mode::Update => self.update_pair(chain, request, &owner, usage).await,
        };

        PairReport {
            port,
            usage,
            owner: owner.fqdn(),
            outcome,
        }
    }

    fn describe(
        &self,
        chain: &CertificateChain,
        request: &SyncRequest,
        owner: &OwnerName,
        usage: Usage,
        action: Action,
    ) -> std::result::Result<RecordDescriptor, PairFailure> {
        RecordDescriptor::build(chain, owner.clone(), usage, request.policy, action, &self.config).in_phase(Phase::Describe)
    }

    /// Zone serving the owner and the live records matching (owner, usage)
    async fn lookup(&self, owner: &OwnerName, usage: Usage) -> std::result::Result<(Zone, Vec<ExistingRecord>), PairFailure> {
        let zones = self.repository.list_zones().await.in_phase(Phase::ZoneLookup)?;
        let zone = select_zone(owner.domain(), &owner.service_host(), &zones)
            .in_phase(Phase::ZoneLookup)?
            .clone();
        debug!(owner = %owner, zone = %zone.name, zone_id = %zone.id, "Selected zone");

        let records = self.repository.list_records(&zone.id).await.in_phase(Phase::RecordLookup)?;
        let existing = find_existing(&records, &owner.fqdn(), usage);
        Ok((zone, existing))
    }

    async fn create_pair(&self, chain: &CertificateChain, request: &SyncRequest, owner: &OwnerName, usage: Usage) -> PairResult {
        let descriptor = self.describe(chain, request, owner, usage, Action::Created)?;
        let (zone, existing) = self.lookup(owner, usage).await?;

        if let Some(record) = existing.first() {
            return Err(SyncError::DuplicateRecord {
                owner: owner.fqdn(),
                usage: usage.value(),
                record_id: record.id.clone(),
            })
            .in_phase(Phase::RecordLookup);
        }

        let record_id = self
            .repository
            .create_record(&zone.id, &descriptor)
            .await
            .in_phase(Phase::Create)?;
        info!(owner = %owner, usage = %usage, record_id = %record_id, "Created TLSA record");
        emit(
            self.events.as_ref(),
            SyncEvent::RecordCreated {
                owner: owner.fqdn(),
                usage,
                record_id: record_id.clone(),
            },
        );
        Ok(PairStatus::Created { record_id })
    }

    async fn update_pair(&self, chain: &CertificateChain, request: &SyncRequest, owner: &OwnerName, usage: Usage) -> PairResult {
        let descriptor = self.describe(chain, request, owner, usage, Action::Updated)?;
        let (zone, existing) = self.lookup(owner, usage).await?;
        let record = first_match(owner, usage, existing)?;

        self.repository
            .update_record(&zone.id, &record.id, &descriptor)
            .await
            .in_phase(Phase::Update)?;
        info!(owner = %owner, usage = %usage, record_id = %record.id, "Updated TLSA record");
        emit(
            self.events.as_ref(),
            SyncEvent::RecordUpdated {
                owner: owner.fqdn(),
                usage,
                record_id: record.id.clone(),
            },
        );
        Ok(PairStatus::Updated { record_id: record.id })
    }

    async fn rollover_pair(&self, chain: &CertificateChain, request: &SyncRequest, owner: &OwnerName, usage: Usage) -> PairResult {
        let descriptor = self.describe(chain, request, owner, usage, Action::Updated)?;
        let (zone, existing) = self.lookup(owner, usage).await?;

        let Some(old) = existing.into_iter().next() else {
            info!(owner = %owner, usage = %usage, "No existing record to roll over, updating in place");
            return self.update_pair(chain, request, owner, usage).await;
        };

        let new_record_id = self
            .repository
            .create_record(&zone.id, &descriptor)
            .await
            .in_phase(Phase::Create)?;
        emit(
            self.events.as_ref(),
            SyncEvent::RecordCreated {
                owner: owner.fqdn(),
                usage,
                record_id: new_record_id.clone(),
            },
        );

        let wait = self.config.rollover_wait(old.ttl);
        info!(
            owner = %owner,
            usage = %usage,
            new_record_id = %new_record_id,
            old_record_id = %old.id,
            "Created new TLSA record. Old record will be deleted in {} seconds",
            wait.as_secs()
        );
        emit(
            self.events.as_ref(),
            SyncEvent::RolloverScheduled {
                owner: owner.fqdn(),
                usage,
                new_record_id: new_record_id.clone(),
                old_record_id: old.id.clone(),
                wait,
            },
        );

        let plan = RolloverPlan {
            owner: owner.fqdn(),
            zone_id: zone.id,
            usage,
            old_record_id: old.id.clone(),
            new_record_id: new_record_id.clone(),
            wait,
        };
        let handle = spawn_rollover(
            plan,
            Arc::clone(&self.repository),
            Arc::clone(&self.verifier),
            self.config.rollover_deadline,
            self.cancel.child_token(),
            self.events.clone(),
        );

        let outcome = handle.wait().await.map_err(|error| PairFailure {
            phase: rollover_phase(&error),
            error,
        })?;

        Ok(PairStatus::RolledOver {
            new_record_id,
            old_record_id: old.id,
            propagation_verified: outcome.propagation_verified,
        })
    }
}

/// First live record of (owner, usage); more than one is logged and tolerated
fn first_match(owner: &OwnerName, usage: Usage, existing: Vec<ExistingRecord>) -> std::result::Result<ExistingRecord, PairFailure> {
    if existing.len() > 1 {
        warn!(
            owner = %owner,
            usage = %usage,
            count = existing.len(),
            "Multiple TLSA records match, using the first"
        );
    }
    existing
        .into_iter()
        .next()
        .ok_or_else(|| SyncError::RecordNotFound {
            owner: owner.fqdn(),
            usage: usage.value(),
        })
        .in_phase(Phase::RecordLookup)
}

fn rollover_phase(error: &SyncError) -> Phase {
    match error {
        SyncError::DeleteFailed { .. } => Phase::Delete,
        _ => Phase::Wait,
    }
}
