use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::period::{MealPeriod, ScheduleConfig};

/// Every state change in a session produces an Event.
/// The CLI `watch` command prints them; tests subscribe to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Fast cycle fetched fresh members and schedule.
    SnapshotRefreshed {
        member_count: usize,
        schedule: ScheduleConfig,
        at: DateTime<Utc>,
    },
    /// A fetch failed; the previous snapshot stays visible.
    FetchFailed {
        target: String,
        error: String,
        at: DateTime<Utc>,
    },
    /// A period transition was applied remotely and committed locally.
    PeriodChanged {
        from: Option<MealPeriod>,
        to: MealPeriod,
        increment_missed: bool,
        at: DateTime<Utc>,
    },
    /// Reconciliation failed; the same transition is retried next tick.
    ReconcileFailed {
        error: String,
        at: DateTime<Utc>,
    },
    /// A tick found another reconciliation in flight and was dropped.
    ReconcileSkipped {
        at: DateTime<Utc>,
    },
    MealMarked {
        member_id: Option<String>,
        at: DateTime<Utc>,
    },
    AwayToggled {
        member_id: Option<String>,
        at: DateTime<Utc>,
    },
    FoodFinishedReported {
        at: DateTime<Utc>,
    },
    FoodFinishedUndone {
        at: DateTime<Utc>,
    },
    PollerStopped {
        at: DateTime<Utc>,
    },
}
