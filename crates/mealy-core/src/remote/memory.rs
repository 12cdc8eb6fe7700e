//! In-process status store.
//!
//! Implements the store contract without a server: the offline CLI mode
//! persists a [`Household`] between invocations, and tests use it to check
//! missed-meal accounting end to end.
//!
//! `reset_eaten` is applied at most once per period occurrence, keyed by
//! `(occurrence date, new period)`, so duplicate resets from overlapping
//! ticks or several clients do not double count.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::store::StatusStore;
use super::types::{Member, ResetRequest};
use crate::error::RemoteError;
use crate::period::{occurrence_date, Clock, MealPeriod, ScheduleConfig, SystemClock};

/// How many applied reset keys to remember.
const RESET_HISTORY: usize = 16;

/// Identifies one occurrence of a meal period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetKey {
    pub date: NaiveDate,
    pub period: MealPeriod,
}

/// Everything the store owns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub members: Vec<Member>,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub food_finished: bool,
    #[serde(default)]
    pub applied_resets: Vec<ResetKey>,
}

impl Household {
    pub fn new(members: Vec<Member>, schedule: ScheduleConfig) -> Self {
        Self {
            members,
            schedule,
            food_finished: false,
            applied_resets: Vec::new(),
        }
    }

    /// Four flatmates, nobody fed yet.
    pub fn demo() -> Self {
        let members = ["Asha", "Ben", "Chidi", "Dana"]
            .iter()
            .map(|name| {
                let id = name.to_lowercase();
                Member::new(id.clone(), *name).with_auth_uid(id)
            })
            .collect();
        Self::new(members, ScheduleConfig::default())
    }

    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }
}

#[derive(Debug, Default)]
struct Switches {
    reset_calls: AtomicUsize,
    unreachable: AtomicBool,
}

/// Shared-state store; clones see the same household.
#[derive(Clone)]
pub struct InMemoryStatusStore {
    household: Arc<Mutex<Household>>,
    acting_uid: Option<String>,
    clock: Arc<dyn Clock>,
    switches: Arc<Switches>,
}

impl InMemoryStatusStore {
    pub fn new(household: Household) -> Self {
        Self::with_clock(household, Arc::new(SystemClock))
    }

    pub fn with_clock(household: Household, clock: Arc<dyn Clock>) -> Self {
        Self {
            household: Arc::new(Mutex::new(household)),
            acting_uid: None,
            clock,
            switches: Arc::new(Switches::default()),
        }
    }

    /// Handle acting as the member whose auth uid (or id) is `uid`.
    pub fn acting_as(&self, uid: impl Into<String>) -> Self {
        Self {
            acting_uid: Some(uid.into()),
            ..self.clone()
        }
    }

    /// Snapshot of the stored household.
    pub fn household(&self) -> Household {
        self.lock().clone()
    }

    /// Number of `reset_eaten` calls received, applied or not.
    pub fn reset_calls(&self) -> usize {
        self.switches.reset_calls.load(Ordering::SeqCst)
    }

    /// Make every call fail with a 503 until switched back.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.switches.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn set_schedule(&self, schedule: ScheduleConfig) {
        self.lock().schedule = schedule;
    }

    fn lock(&self) -> MutexGuard<'_, Household> {
        self.household.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn reachable(&self, endpoint: &str) -> Result<(), RemoteError> {
        if self.switches.unreachable.load(Ordering::SeqCst) {
            return Err(RemoteError::Http {
                endpoint: endpoint.to_string(),
                status: 503,
                body: "store unreachable".into(),
            });
        }
        Ok(())
    }

    fn with_acting_member<T>(
        &self,
        endpoint: &str,
        apply: impl FnOnce(&mut Member) -> T,
    ) -> Result<T, RemoteError> {
        self.reachable(endpoint)?;
        let uid = self
            .acting_uid
            .as_deref()
            .ok_or_else(|| RemoteError::Rejected("no acting member".into()))?;
        let mut household = self.lock();
        let member = household
            .members
            .iter_mut()
            .find(|m| m.auth_uid.as_deref() == Some(uid) || m.id == uid)
            .ok_or_else(|| RemoteError::Rejected(format!("unknown member '{uid}'")))?;
        Ok(apply(member))
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_members(&self) -> Result<Vec<Member>, RemoteError> {
        self.reachable("members")?;
        Ok(self.lock().members.clone())
    }

    async fn fetch_schedule(&self) -> Result<ScheduleConfig, RemoteError> {
        self.reachable("schedule")?;
        Ok(self.lock().schedule)
    }

    async fn reset_eaten(&self, request: &ResetRequest) -> Result<(), RemoteError> {
        self.switches.reset_calls.fetch_add(1, Ordering::SeqCst);
        self.reachable("reset-eaten")?;

        let now = self.clock.now();
        let mut household = self.lock();
        let key = ResetKey {
            date: occurrence_date(now, &household.schedule, request.new_period),
            period: request.new_period,
        };
        if household.applied_resets.contains(&key) {
            tracing::debug!(
                "reset into {} on {} already applied; ignoring duplicate",
                key.period,
                key.date
            );
            return Ok(());
        }

        for member in household.members.iter_mut() {
            if request.increment_missed && !member.is_away && !member.has_eaten {
                member.missed_meal_count += 1;
            }
            member.has_eaten = false;
        }
        household.food_finished = false;
        household.applied_resets.push(key);
        if household.applied_resets.len() > RESET_HISTORY {
            household.applied_resets.remove(0);
        }
        Ok(())
    }

    async fn mark_eaten(&self) -> Result<(), RemoteError> {
        self.with_acting_member("mark-eaten", |member| {
            member.has_eaten = true;
            member.last_eaten_at = Some(Utc::now());
        })
    }

    async fn toggle_away(&self) -> Result<(), RemoteError> {
        self.with_acting_member("toggle-away", |member| {
            member.is_away = !member.is_away;
        })
    }

    async fn report_food_finished(&self) -> Result<(), RemoteError> {
        self.with_acting_member("report-food-finished", |_| ())?;
        self.lock().food_finished = true;
        Ok(())
    }

    async fn undo_food_finished(&self) -> Result<(), RemoteError> {
        self.with_acting_member("undo-food-finished", |_| ())?;
        self.lock().food_finished = false;
        Ok(())
    }
}
