//! Period transition state machine.
//!
//! ```text
//! none -> lunch <-> dinner
//! ```
//!
//! Each evaluation detects the period for the current hour. When it
//! differs from the recorded one, a single reset is sent to the store and,
//! once the store accepts it, the new period is committed locally with the
//! food-finished override cleared. A failed reset leaves local state alone
//! so the next evaluation retries the same transition.
//!
//! [`PeriodState`] sits behind one async mutex shared with the override
//! actions. Evaluations only `try_lock` it: a tick that overlaps an
//! in-flight evaluation is dropped instead of sending a second reset.
//!
//! If saving fails after the store accepted a reset, the committed state is
//! kept in memory, the storage error is returned, and the next evaluation
//! retries the save before it looks at the clock again.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{ActionError, CoreError, StorageError};
use crate::period::{detect, MealPeriod, ScheduleConfig};
use crate::remote::{Member, ResetRequest, StatusStore};
use crate::storage::{LocalPersistence, PeriodState};

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Detected period equals the recorded one.
    Unchanged(MealPeriod),
    /// Reset accepted and committed. `members` is the refreshed snapshot,
    /// `None` if the refresh after the reset failed.
    Transitioned {
        from: Option<MealPeriod>,
        to: MealPeriod,
        increment_missed: bool,
        members: Option<Vec<Member>>,
    },
    /// Another evaluation or an override action held the state.
    Busy,
}

pub struct StatusReconciler {
    store: Arc<dyn StatusStore>,
    persistence: Arc<dyn LocalPersistence>,
    state: Mutex<Tracked>,
}

struct Tracked {
    current: PeriodState,
    /// In-memory state is ahead of what persistence holds.
    unsaved: bool,
}

impl Tracked {
    fn persist(&mut self, persistence: &dyn LocalPersistence) -> Result<(), StorageError> {
        match self.current.save(persistence) {
            Ok(()) => {
                self.unsaved = false;
                Ok(())
            }
            Err(e) => {
                self.unsaved = true;
                Err(e)
            }
        }
    }
}

impl StatusReconciler {
    /// Restore state from `persistence`. Unreadable state is logged and
    /// replaced by the pre-initialization default.
    pub fn new(store: Arc<dyn StatusStore>, persistence: Arc<dyn LocalPersistence>) -> Self {
        let state = match PeriodState::load(persistence.as_ref()) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("discarding unreadable period state: {e}");
                PeriodState::default()
            }
        };
        tracing::debug!(
            "restored period state: period={} override={}",
            MealPeriod::label_of(state.current_period),
            state.food_finished_override
        );
        Self {
            store,
            persistence,
            state: Mutex::new(Tracked {
                current: state,
                unsaved: false,
            }),
        }
    }

    /// Current state; waits for any in-flight evaluation or action.
    pub async fn state(&self) -> PeriodState {
        self.state.lock().await.current
    }

    /// True while a committed state still waits to be saved.
    pub async fn has_unsaved_state(&self) -> bool {
        self.state.lock().await.unsaved
    }

    /// Detect the period for `hour` and apply a transition if one is due.
    ///
    /// # Errors
    /// Returns the store error when the reset fails; local state is then
    /// unchanged. Returns the storage error when the accepted transition
    /// (or an earlier one) could not be saved.
    pub async fn reconcile(
        &self,
        hour: u8,
        schedule: &ScheduleConfig,
    ) -> Result<ReconcileOutcome, CoreError> {
        let Ok(mut tracked) = self.state.try_lock() else {
            tracing::debug!("reconciliation already in flight; dropping tick");
            return Ok(ReconcileOutcome::Busy);
        };

        if tracked.unsaved {
            tracked.persist(self.persistence.as_ref())?;
            tracing::info!(
                "saved pending period state: {}",
                MealPeriod::label_of(tracked.current.current_period)
            );
        }
        let state = tracked.current;

        let detected = detect(hour, schedule);
        if state.current_period == Some(detected) {
            return Ok(ReconcileOutcome::Unchanged(detected));
        }

        let request = ResetRequest {
            previous_period: state.current_period,
            new_period: detected,
            increment_missed: !state.food_finished_override,
        };
        tracing::info!(
            "meal period changed {} -> {} (increment missed: {})",
            MealPeriod::label_of(request.previous_period),
            request.new_period,
            request.increment_missed
        );

        self.store.reset_eaten(&request).await?;

        // Commit before the refresh await so a cancelled refresh cannot
        // leave the accepted reset unrecorded.
        tracked.current = PeriodState {
            current_period: Some(detected),
            food_finished_override: false,
        };
        if let Err(e) = tracked.persist(self.persistence.as_ref()) {
            tracing::error!("period {} applied but not persisted, will retry: {e}", detected);
            return Err(e.into());
        }

        let members = match self.store.fetch_members().await {
            Ok(members) => Some(members),
            Err(e) => {
                tracing::warn!("refresh after reset failed: {e}");
                None
            }
        };

        Ok(ReconcileOutcome::Transitioned {
            from: request.previous_period,
            to: detected,
            increment_missed: request.increment_missed,
            members,
        })
    }

    /// Send "food finished" and raise the override.
    ///
    /// # Errors
    /// [`ActionError::OverrideActive`] if already raised; the store error if
    /// the command fails (override unchanged).
    pub async fn report_food_finished(&self) -> Result<(), CoreError> {
        let mut tracked = self.state.lock().await;
        if tracked.current.food_finished_override {
            return Err(ActionError::OverrideActive.into());
        }
        self.store.report_food_finished().await?;
        tracked.current.food_finished_override = true;
        tracked.persist(self.persistence.as_ref())?;
        Ok(())
    }

    /// Send "undo" and clear the override. The command is sent even when
    /// the override is already clear.
    pub async fn undo_food_finished(&self) -> Result<(), CoreError> {
        let mut tracked = self.state.lock().await;
        self.store.undo_food_finished().await?;
        tracked.current.food_finished_override = false;
        tracked.persist(self.persistence.as_ref())?;
        Ok(())
    }
}
