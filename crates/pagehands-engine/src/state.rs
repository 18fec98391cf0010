//! Action lifecycle tracking.
//!
//! Every accepted action gets an [`ActionRecord`]. Records move
//! `pending -> in_progress -> completed | failed` (or `pending -> failed`),
//! and only one record holds the execution slot at a time. Callers that
//! submit concurrently are queued on the slot in FIFO order rather than
//! rejected.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::{OwnedMutexGuard, watch};
use tracing::{debug, warn};

use pagehands_protocols::{ActionId, ActionRecord, ActionStatus, ActionType, EngineError};

struct Inner {
    records: HashMap<ActionId, ActionRecord>,
    /// Finished ids, oldest first. Bounded by the history limit.
    finished: VecDeque<ActionId>,
    in_flight: Option<(ActionId, OwnedMutexGuard<()>)>,
}

/// Owns every [`ActionRecord`] and the single execution slot.
pub struct ActionStateManager {
    inner: Mutex<Inner>,
    slot: Arc<tokio::sync::Mutex<()>>,
    active: watch::Sender<usize>,
    history_limit: usize,
}

impl ActionStateManager {
    pub fn new(history_limit: usize) -> Self {
        let (active, _) = watch::channel(0);
        Self {
            inner: Mutex::new(Inner {
                records: HashMap::new(),
                finished: VecDeque::new(),
                in_flight: None,
            }),
            slot: Arc::new(tokio::sync::Mutex::new(())),
            active,
            history_limit,
        }
    }

    /// Register a newly accepted action as pending.
    pub fn start(&self, id: ActionId, action_type: ActionType) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        if inner.records.contains_key(&id) {
            return Err(EngineError::IllegalTransition {
                id,
                message: "action already registered".to_string(),
            });
        }
        inner.records.insert(id, ActionRecord::new(id, action_type));
        self.active.send_modify(|n| *n += 1);
        debug!(action_id = %id, action = %action_type, "Action registered");
        Ok(())
    }

    /// Wait for the execution slot, then move `id` to in-progress.
    pub async fn mark_in_progress(&self, id: ActionId) -> Result<(), EngineError> {
        self.expect_status(id, ActionStatus::Pending)?;

        let guard = self.slot.clone().lock_owned().await;

        let mut inner = self.inner.lock();
        let record = inner
            .records
            .get_mut(&id)
            .ok_or(EngineError::UnknownAction(id))?;
        if record.status != ActionStatus::Pending {
            // Failed while queued; the guard is released on return.
            return Err(EngineError::IllegalTransition {
                id,
                message: format!("cannot start a {:?} action", record.status),
            });
        }
        record.status = ActionStatus::InProgress;
        inner.in_flight = Some((id, guard));
        debug!(action_id = %id, "Action in progress");
        Ok(())
    }

    pub fn complete(&self, id: ActionId) -> Result<(), EngineError> {
        self.finish(id, ActionStatus::Completed, None)
    }

    /// Mark `id` failed. Allowed from pending as well as in-progress.
    pub fn fail(&self, id: ActionId, error: impl Into<String>) -> Result<(), EngineError> {
        self.finish(id, ActionStatus::Failed, Some(error.into()))
    }

    pub fn has_active_action(&self) -> bool {
        *self.active.borrow() > 0
    }

    /// Number of pending plus in-progress actions.
    pub fn active_count(&self) -> usize {
        *self.active.borrow()
    }

    /// Resolves once no action is pending or in progress.
    pub async fn wait_for_all_actions(&self) {
        let mut rx = self.active.subscribe();
        // The sender lives as long as `self`, so this cannot observe a close.
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    /// The action currently holding the execution slot.
    pub fn in_progress(&self) -> Option<ActionId> {
        self.inner.lock().in_flight.as_ref().map(|(id, _)| *id)
    }

    pub fn record(&self, id: ActionId) -> Option<ActionRecord> {
        self.inner.lock().records.get(&id).cloned()
    }

    /// All retained records, oldest first.
    pub fn records(&self) -> Vec<ActionRecord> {
        let inner = self.inner.lock();
        let mut records: Vec<ActionRecord> = inner.records.values().cloned().collect();
        records.sort_by_key(|r| r.start_time);
        records
    }

    fn expect_status(&self, id: ActionId, expected: ActionStatus) -> Result<(), EngineError> {
        let inner = self.inner.lock();
        let record = inner.records.get(&id).ok_or(EngineError::UnknownAction(id))?;
        if record.status != expected {
            return Err(EngineError::IllegalTransition {
                id,
                message: format!("expected {:?}, found {:?}", expected, record.status),
            });
        }
        Ok(())
    }

    fn finish(
        &self,
        id: ActionId,
        status: ActionStatus,
        error: Option<String>,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        let record = inner
            .records
            .get_mut(&id)
            .ok_or(EngineError::UnknownAction(id))?;

        let allowed = match status {
            ActionStatus::Completed => record.status == ActionStatus::InProgress,
            ActionStatus::Failed => record.status.is_active(),
            ActionStatus::Pending | ActionStatus::InProgress => false,
        };
        if !allowed {
            return Err(EngineError::IllegalTransition {
                id,
                message: format!("cannot move from {:?} to {:?}", record.status, status),
            });
        }

        record.status = status;
        record.end_time = Some(Utc::now());
        record.error = error;

        if inner.in_flight.as_ref().is_some_and(|(held, _)| *held == id) {
            inner.in_flight = None;
        }

        inner.finished.push_back(id);
        while inner.finished.len() > self.history_limit {
            if let Some(evicted) = inner.finished.pop_front() {
                inner.records.remove(&evicted);
            }
        }
        drop(inner);

        self.active.send_modify(|n| *n = n.saturating_sub(1));
        debug!(action_id = %id, status = ?status, "Action finished");
        Ok(())
    }
}

/// Fails its action on drop unless it was explicitly finished.
///
/// Holding one across the execution of an action guarantees the record
/// leaves the active set even when the executing future is dropped.
pub struct ActionGuard {
    state: Arc<ActionStateManager>,
    id: ActionId,
    armed: bool,
}

impl ActionGuard {
    pub fn new(state: Arc<ActionStateManager>, id: ActionId) -> Self {
        Self {
            state,
            id,
            armed: true,
        }
    }

    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn complete(mut self) -> Result<(), EngineError> {
        self.armed = false;
        self.state.complete(self.id)
    }

    pub fn fail(mut self, error: impl Into<String>) -> Result<(), EngineError> {
        self.armed = false;
        self.state.fail(self.id, error)
    }
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!(action_id = %self.id, "Action dropped before finishing");
            let _ = self.state.fail(self.id, "action was dropped before finishing");
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
