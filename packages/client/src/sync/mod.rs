//! Synchronization engine and rollover protocol

pub mod engine;
pub mod events;
pub mod report;
pub mod request;
pub mod rollover;

pub use engine::SyncEngine;
pub use events::{EventSender, SyncEvent};
pub use report::{BatchReport, PairFailure, PairReport, PairStatus, Phase};
pub use request::SyncRequest;
pub use rollover::{
    RolloverHandle, RolloverOutcome, RolloverPlan, RolloverState, RolloverTracker, spawn_rollover,
};
