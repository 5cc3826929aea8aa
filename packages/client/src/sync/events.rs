//! Progress events emitted while a batch runs

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::tlsa::Usage;

/// Channel the engine publishes progress on
pub type EventSender = mpsc::UnboundedSender<SyncEvent>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    RecordCreated {
        owner: String,
        usage: Usage,
        record_id: String,
    },
    RecordUpdated {
        owner: String,
        usage: Usage,
        record_id: String,
    },
    RolloverScheduled {
        owner: String,
        usage: Usage,
        new_record_id: String,
        old_record_id: String,
        wait: Duration,
    },
    PropagationChecked {
        owner: String,
        success: bool,
        detail: String,
    },
    OldRecordDeleted {
        owner: String,
        usage: Usage,
        record_id: String,
    },
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncEvent::RecordCreated { owner, usage, record_id } => {
                write!(f, "Created {usage} TLSA record for {owner} (id {record_id})")
            }
            SyncEvent::RecordUpdated { owner, usage, record_id } => {
                write!(f, "Updated {usage} TLSA record for {owner} (id {record_id})")
            }
            SyncEvent::RolloverScheduled { owner, wait, .. } => write!(
                f,
                "Created new TLSA record. Old record will be deleted in {} seconds ({owner})",
                wait.as_secs()
            ),
            SyncEvent::PropagationChecked { owner, success: true, .. } => {
                write!(f, "DNS propagation verified for {owner}")
            }
            SyncEvent::PropagationChecked { owner, success: false, detail } => {
                write!(f, "DNS propagation check failed for {owner}: {detail}")
            }
            SyncEvent::OldRecordDeleted { owner, record_id, .. } => {
                write!(f, "Deleted old TLSA record {record_id} for {owner}")
            }
        }
    }
}

/// Publish an event; a dropped receiver is not an error
pub(crate) fn emit(events: Option<&EventSender>, event: SyncEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}
