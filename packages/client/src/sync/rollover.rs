//! Background rollover: wait, verify, then delete the superseded record
//!
//! The new record is already live when a rollover task starts. The task sleeps
//! for the planned wait, runs the advisory propagation check and finally deletes
//! the old record by id. Cancellation and the optional deadline are honored up to
//! the moment deletion starts; once `Deleting` is reached the delete call runs to
//! completion. A failure never removes the new record.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::events::{EventSender, SyncEvent, emit};
use crate::dns::PropagationVerifier;
use crate::error::{Result, SyncError, delete_failed};
use crate::provider::RecordRepository;
use crate::tlsa::Usage;

/// Rollover progress; transitions only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RolloverState {
    Idle,
    Created,
    AwaitingPropagation,
    Verified,
    Deleting,
    Completed,
    Failed,
}

impl RolloverState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, RolloverState::Completed | RolloverState::Failed)
    }
}

/// Forward-only state holder with the visited states
#[derive(Debug, Clone)]
pub struct RolloverTracker {
    state: RolloverState,
    history: Vec<RolloverState>,
}

impl Default for RolloverTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RolloverTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RolloverState::Idle,
            history: vec![RolloverState::Idle],
        }
    }

    #[must_use]
    pub fn state(&self) -> RolloverState {
        self.state
    }

    #[must_use]
    pub fn history(&self) -> &[RolloverState] {
        &self.history
    }

    /// Move to `next`; returns false and stays put for backward moves or when
    /// the current state is terminal
    pub fn advance(&mut self, next: RolloverState) -> bool {
        if self.state.is_terminal() || next <= self.state {
            debug!(from = ?self.state, to = ?next, "Ignoring rollover transition");
            return false;
        }
        self.state = next;
        self.history.push(next);
        true
    }

    pub fn fail(&mut self) -> bool {
        self.advance(RolloverState::Failed)
    }
}

/// Everything the background task needs; the new record already exists
#[derive(Debug, Clone)]
pub struct RolloverPlan {
    pub owner: String,
    pub zone_id: String,
    pub usage: Usage,
    pub old_record_id: String,
    pub new_record_id: String,
    pub wait: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloverOutcome {
    pub propagation_verified: bool,
    pub states: Vec<RolloverState>,
}

/// Completion signal and cancellation switch of a spawned rollover
#[derive(Debug)]
pub struct RolloverHandle {
    owner: String,
    cancel: CancellationToken,
    done: oneshot::Receiver<Result<RolloverOutcome>>,
}

impl RolloverHandle {
    /// Stop the rollover unless deletion already started
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the task to finish
    ///
    /// # Errors
    ///
    /// Returns the task's error, or `SyncError::RolloverTask` if the task ended
    /// without reporting.
    pub async fn wait(self) -> Result<RolloverOutcome> {
        match self.done.await {
            Ok(result) => result,
            Err(_) => Err(SyncError::RolloverTask { owner: self.owner }),
        }
    }
}

/// Spawn the wait-verify-delete sequence for `plan`
///
/// `deadline` bounds the whole task from the moment it is spawned.
#[must_use]
pub fn spawn_rollover(
    plan: RolloverPlan,
    repository: Arc<dyn RecordRepository>,
    verifier: Arc<dyn PropagationVerifier>,
    deadline: Option<Duration>,
    cancel: CancellationToken,
    events: Option<EventSender>,
) -> RolloverHandle {
    let (tx, rx) = oneshot::channel();
    let owner = plan.owner.clone();
    let token = cancel.clone();
    let deadline_at = deadline.map(|d| Instant::now() + d);

    tokio::spawn(async move {
        let result = run_rollover(plan, repository, verifier, deadline, deadline_at, token, events).await;
        let _ = tx.send(result);
    });

    RolloverHandle {
        owner,
        cancel,
        done: rx,
    }
}

enum Interrupt {
    Cancelled,
    DeadlineElapsed,
}

/// Run `fut` unless the token fires or the deadline passes first
async fn guarded<F: Future>(
    cancel: &CancellationToken,
    deadline_at: Option<Instant>,
    fut: F,
) -> std::result::Result<F::Output, Interrupt> {
    let deadline = async {
        match deadline_at {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Interrupt::Cancelled),
        () = deadline => Err(Interrupt::DeadlineElapsed),
        output = fut => Ok(output),
    }
}

fn interrupted(plan: &RolloverPlan, interrupt: Interrupt, deadline: Option<Duration>) -> SyncError {
    match interrupt {
        Interrupt::Cancelled => SyncError::RolloverCancelled {
            owner: plan.owner.clone(),
        },
        Interrupt::DeadlineElapsed => SyncError::RolloverDeadline {
            owner: plan.owner.clone(),
            deadline_secs: deadline.map_or(0, |d| d.as_secs()),
        },
    }
}

async fn run_rollover(
    plan: RolloverPlan,
    repository: Arc<dyn RecordRepository>,
    verifier: Arc<dyn PropagationVerifier>,
    deadline: Option<Duration>,
    deadline_at: Option<Instant>,
    cancel: CancellationToken,
    events: Option<EventSender>,
) -> Result<RolloverOutcome> {
    let mut tracker = RolloverTracker::new();
    tracker.advance(RolloverState::Created);
    tracker.advance(RolloverState::AwaitingPropagation);

    debug!(owner = %plan.owner, wait_secs = plan.wait.as_secs(), "Waiting before deleting old record");
    if let Err(interrupt) = guarded(&cancel, deadline_at, tokio::time::sleep(plan.wait)).await {
        tracker.fail();
        let err = interrupted(&plan, interrupt, deadline);
        warn!(owner = %plan.owner, error = %err, "Rollover stopped, old record kept");
        return Err(err);
    }

    let check = match guarded(&cancel, deadline_at, verifier.verify(&plan.owner)).await {
        Ok(check) => check,
        Err(interrupt) => {
            tracker.fail();
            let err = interrupted(&plan, interrupt, deadline);
            warn!(owner = %plan.owner, error = %err, "Rollover stopped, old record kept");
            return Err(err);
        }
    };

    let propagation_verified = match check {
        Ok(report) => {
            info!(
                owner = %plan.owner,
                resolvers = report.answers.len(),
                with_records = report.resolvers_with_records(),
                "DNS propagation verified"
            );
            emit(
                events.as_ref(),
                SyncEvent::PropagationChecked {
                    owner: plan.owner.clone(),
                    success: true,
                    detail: String::new(),
                },
            );
            true
        }
        Err(e) => {
            warn!(owner = %plan.owner, error = %e, "DNS propagation check failed, deleting old record anyway");
            emit(
                events.as_ref(),
                SyncEvent::PropagationChecked {
                    owner: plan.owner.clone(),
                    success: false,
                    detail: e.to_string(),
                },
            );
            false
        }
    };
    tracker.advance(RolloverState::Verified);

    if cancel.is_cancelled() {
        tracker.fail();
        return Err(interrupted(&plan, Interrupt::Cancelled, deadline));
    }
    tracker.advance(RolloverState::Deleting);

    if let Err(e) = repository.delete_record(&plan.zone_id, &plan.old_record_id).await {
        tracker.fail();
        warn!(
            owner = %plan.owner,
            record_id = %plan.old_record_id,
            new_record_id = %plan.new_record_id,
            error = %e,
            "Failed to delete old record, new record stays in place"
        );
        return Err(delete_failed(&plan.owner, &plan.old_record_id, e));
    }

    tracker.advance(RolloverState::Completed);
    info!(owner = %plan.owner, record_id = %plan.old_record_id, "Deleted old TLSA record");
    emit(
        events.as_ref(),
        SyncEvent::OldRecordDeleted {
            owner: plan.owner.clone(),
            usage: plan.usage,
            record_id: plan.old_record_id.clone(),
        },
    );

    Ok(RolloverOutcome {
        propagation_verified,
        states: tracker.history().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_moves_forward_only() {
        let mut tracker = RolloverTracker::new();
        assert!(tracker.advance(RolloverState::Created));
        assert!(tracker.advance(RolloverState::AwaitingPropagation));
        assert!(!tracker.advance(RolloverState::Created));
        assert_eq!(tracker.state(), RolloverState::AwaitingPropagation);
    }

    #[test]
    fn test_tracker_terminal_states_are_final() {
        let mut tracker = RolloverTracker::new();
        assert!(tracker.fail());
        assert!(!tracker.advance(RolloverState::Completed));
        assert_eq!(tracker.state(), RolloverState::Failed);

        let mut done = RolloverTracker::new();
        assert!(done.advance(RolloverState::Completed));
        assert!(!done.fail());
        assert_eq!(done.history(), &[RolloverState::Idle, RolloverState::Completed]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_guarded_deadline() {
        let cancel = CancellationToken::new();
        let at = Instant::now() + Duration::from_secs(5);
        let result = guarded(&cancel, Some(at), tokio::time::sleep(Duration::from_secs(60))).await;
        assert!(matches!(result, Err(Interrupt::DeadlineElapsed)));
    }

    #[tokio::test]
    async fn test_guarded_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = guarded(&cancel, None, std::future::pending::<()>()).await;
        assert!(matches!(result, Err(Interrupt::Cancelled)));
    }

    #[tokio::test]
    async fn test_guarded_completes() {
        let cancel = CancellationToken::new();
        let result = guarded(&cancel, None, async { 7 }).await;
        assert!(matches!(result, Ok(7)));
    }
}
