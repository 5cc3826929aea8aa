//! Per-pair results and their aggregation

use std::fmt;

use crate::error::{Result, SyncError};
use crate::tlsa::Usage;

/// Step of a pair's workflow an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Describe,
    ZoneLookup,
    RecordLookup,
    Create,
    Update,
    Wait,
    Delete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Describe => "describe",
            Phase::ZoneLookup => "zone lookup",
            Phase::RecordLookup => "record lookup",
            Phase::Create => "create",
            Phase::Update => "update",
            Phase::Wait => "rollover wait",
            Phase::Delete => "delete old record",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairStatus {
    Created {
        record_id: String,
    },
    Updated {
        record_id: String,
    },
    RolledOver {
        new_record_id: String,
        old_record_id: String,
        /// The advisory resolver check passed before the old record was deleted
        propagation_verified: bool,
    },
}

#[derive(Debug)]
pub struct PairFailure {
    pub phase: Phase,
    pub error: SyncError,
}

impl fmt::Display for PairFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.phase, self.error)
    }
}

/// Attach the phase to an engine-level error
pub(crate) trait InPhase<T> {
    fn in_phase(self, phase: Phase) -> std::result::Result<T, PairFailure>;
}

impl<T> InPhase<T> for Result<T> {
    fn in_phase(self, phase: Phase) -> std::result::Result<T, PairFailure> {
        self.map_err(|error| PairFailure { phase, error })
    }
}

/// Result for one (port, usage) pair
#[derive(Debug)]
pub struct PairReport {
    pub port: u16,
    pub usage: Usage,
    pub owner: String,
    pub outcome: std::result::Result<PairStatus, PairFailure>,
}

impl PairReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

impl fmt::Display for PairReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(PairStatus::Created { record_id }) => {
                write!(f, "{} {}: created record {record_id}", self.owner, self.usage)
            }
            Ok(PairStatus::Updated { record_id }) => {
                write!(f, "{} {}: updated record {record_id}", self.owner, self.usage)
            }
            Ok(PairStatus::RolledOver {
                new_record_id,
                old_record_id,
                propagation_verified,
            }) => write!(
                f,
                "{} {}: rolled over {old_record_id} -> {new_record_id}{}",
                self.owner,
                self.usage,
                if *propagation_verified { "" } else { " (propagation unverified)" }
            ),
            Err(failure) => write!(f, "{} {}: {failure}", self.owner, self.usage),
        }
    }
}

/// Every pair of a batch, in request order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub pairs: Vec<PairReport>,
}

impl BatchReport {
    #[must_use]
    pub fn new(pairs: Vec<PairReport>) -> Self {
        Self { pairs }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.pairs.iter().all(PairReport::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &PairReport> {
        self.pairs.iter().filter(|p| !p.is_success())
    }

    pub fn successes(&self) -> impl Iterator<Item = &PairReport> {
        self.pairs.iter().filter(|p| p.is_success())
    }

    /// # Errors
    ///
    /// Returns `SyncError::BatchFailed` if any pair failed.
    pub fn ensure_success(&self) -> Result<()> {
        let failed = self.failures().count();
        if failed == 0 {
            return Ok(());
        }
        Err(SyncError::BatchFailed {
            failed,
            total: self.pairs.len(),
        })
    }
}
