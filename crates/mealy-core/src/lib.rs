//! # Mealy Core Library
//!
//! Meal-period tracking for a shared household. Every client runs the same
//! small engine: it works out whether it is lunch or dinner, tells the
//! shared status store when the period flips (so "has eaten" flags reset
//! and missed meals are counted), and keeps a local record so a restart
//! does not repeat a transition.
//!
//! ## Architecture
//!
//! - **Period**: pure hour-to-period detection against a two-boundary schedule
//! - **Reconciler**: the transition state machine and the food-finished override
//! - **Remote**: the status store contract, an HTTP client and an in-memory store
//! - **Storage**: SQLite key-value persistence, TOML configuration, credentials
//! - **Session / Poller**: snapshot, user actions and the two background cycles
//!
//! ## Key Components
//!
//! - [`StatusReconciler`]: detect-and-transition with duplicate suppression
//! - [`MealSession`]: what the CLI drives
//! - [`Poller`]: fast fetch cycle plus slow reconcile cycle
//! - [`MembershipView`]: eaten / waiting / away partitions and the ranking

pub mod error;
pub mod events;
pub mod membership;
pub mod period;
pub mod poller;
pub mod reconciler;
pub mod remote;
pub mod session;
pub mod storage;


pub use error::{
    ActionError, ConfigError, CoreError, RemoteError, StorageError, ValidationError,
};
pub use events::Event;
pub use membership::{Eligibility, MembershipView, RankEntry};
pub use period::{Clock, FixedClock, MealPeriod, ScheduleConfig, SystemClock};
pub use poller::{Poller, PollerConfig, PollerHandle};
pub use reconciler::{ReconcileOutcome, StatusReconciler};
pub use remote::{HttpStatusStore, InMemoryStatusStore, Member, StatusStore};
pub use session::{MealSession, Snapshot, StatusReport};
pub use storage::{Config, Database, LocalPersistence, MemoryStore, PeriodState};
