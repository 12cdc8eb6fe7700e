//! A client session: the latest snapshot, the acting member, and every
//! operation the poller or a user can trigger.
//!
//! Background cycles ([`MealSession::refresh`], [`MealSession::reconcile`])
//! report failures through events and logs. User actions return their
//! errors to the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

use crate::error::{ActionError, CoreError, RemoteError, ValidationError};
use crate::events::Event;
use crate::membership::{Eligibility, MembershipView};
use crate::period::{detect, Clock, MealPeriod, ScheduleConfig, SystemClock};
use crate::reconciler::{ReconcileOutcome, StatusReconciler};
use crate::remote::{Member, StatusStore};
use crate::storage::{LocalPersistence, PeriodState};

const EVENT_CAPACITY: usize = 64;

/// Last fetched members and schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub members: Vec<Member>,
    pub schedule: ScheduleConfig,
    pub members_fetched_at: Option<DateTime<Utc>>,
    pub schedule_fetched_at: Option<DateTime<Utc>>,
}

/// Everything `status` shows.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub period: MealPeriod,
    pub headline: &'static str,
    pub recorded_period: Option<MealPeriod>,
    pub food_finished: bool,
    pub schedule: ScheduleConfig,
    pub me: Option<Member>,
    pub my_eligibility: Option<Eligibility>,
    pub view: MembershipView,
}

pub struct MealSession {
    store: Arc<dyn StatusStore>,
    reconciler: StatusReconciler,
    clock: Arc<dyn Clock>,
    member_uid: Option<String>,
    snapshot: RwLock<Snapshot>,
    events: broadcast::Sender<Event>,
}

impl MealSession {
    pub fn new(store: Arc<dyn StatusStore>, persistence: Arc<dyn LocalPersistence>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            reconciler: StatusReconciler::new(store.clone(), persistence),
            store,
            clock: Arc::new(SystemClock),
            member_uid: None,
            snapshot: RwLock::new(Snapshot::default()),
            events,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Schedule to use until the first successful schedule fetch.
    pub fn with_schedule(self, schedule: ScheduleConfig) -> Self {
        self.write_snapshot(|s| s.schedule = schedule);
        self
    }

    /// Acting member, matched against auth uid then id.
    pub fn with_member_uid(mut self, uid: Option<String>) -> Self {
        self.member_uid = uid.filter(|u| !u.is_empty());
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn schedule(&self) -> ScheduleConfig {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .schedule
    }

    /// Period for the clock's current hour under the latest schedule.
    pub fn current_period(&self) -> MealPeriod {
        detect(self.clock.current_hour(), &self.schedule())
    }

    pub async fn period_state(&self) -> PeriodState {
        self.reconciler.state().await
    }

    pub fn acting_member(&self) -> Option<Member> {
        let uid = self.member_uid.as_deref()?;
        let snapshot = self.snapshot.read().unwrap_or_else(|e| e.into_inner());
        snapshot
            .members
            .iter()
            .find(|m| m.auth_uid.as_deref() == Some(uid))
            .or_else(|| snapshot.members.iter().find(|m| m.id == uid))
            .cloned()
    }

    pub fn view(&self) -> Result<MembershipView, ValidationError> {
        let snapshot = self.snapshot.read().unwrap_or_else(|e| e.into_inner());
        MembershipView::from_members(&snapshot.members)
    }

    pub async fn status_report(&self) -> Result<StatusReport, CoreError> {
        let state = self.period_state().await;
        let period = self.current_period();
        let me = self.acting_member();
        Ok(StatusReport {
            period,
            headline: period.headline(),
            recorded_period: state.current_period,
            food_finished: state.food_finished_override,
            schedule: self.schedule(),
            my_eligibility: me.as_ref().map(Eligibility::of),
            me,
            view: self.view()?,
        })
    }

    /// Fast cycle: fetch members and schedule.
    ///
    /// A failed schedule fetch keeps the previous schedule. Returns the
    /// first error after applying whatever did succeed.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let (members, schedule) =
            tokio::join!(self.store.fetch_members(), self.store.fetch_schedule());
        let now = Utc::now();

        let schedule_result = match schedule {
            Ok(schedule) => {
                self.write_snapshot(|s| {
                    s.schedule = schedule;
                    s.schedule_fetched_at = Some(now);
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!("schedule fetch failed, keeping last known schedule: {e}");
                self.emit(Event::FetchFailed {
                    target: "schedule".into(),
                    error: e.to_string(),
                    at: now,
                });
                Err(e)
            }
        };

        self.apply_members(members, now)?;
        schedule_result.map_err(CoreError::from)
    }

    /// Fetch members only. Actions use this so a schedule outage cannot
    /// block them.
    pub async fn refresh_members(&self) -> Result<(), CoreError> {
        let members = self.store.fetch_members().await;
        self.apply_members(members, Utc::now())
    }

    fn apply_members(
        &self,
        members: Result<Vec<Member>, RemoteError>,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        match members {
            Ok(members) => {
                let member_count = members.len();
                self.set_members(members);
                self.emit(Event::SnapshotRefreshed {
                    member_count,
                    schedule: self.schedule(),
                    at: now,
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!("member fetch failed, keeping last snapshot: {e}");
                self.emit(Event::FetchFailed {
                    target: "members".into(),
                    error: e.to_string(),
                    at: now,
                });
                Err(e.into())
            }
        }
    }

    /// Slow cycle: detect-and-transition with the latest schedule.
    pub async fn reconcile(&self) -> Result<ReconcileOutcome, CoreError> {
        let hour = self.clock.current_hour();
        let schedule = self.schedule();
        let result = self.reconciler.reconcile(hour, &schedule).await;
        match &result {
            Ok(ReconcileOutcome::Transitioned {
                from,
                to,
                increment_missed,
                members,
            }) => {
                if let Some(members) = members {
                    self.set_members(members.clone());
                }
                self.emit(Event::PeriodChanged {
                    from: *from,
                    to: *to,
                    increment_missed: *increment_missed,
                    at: Utc::now(),
                });
            }
            Ok(ReconcileOutcome::Busy) => self.emit(Event::ReconcileSkipped { at: Utc::now() }),
            Ok(ReconcileOutcome::Unchanged(_)) => {}
            Err(e) => {
                tracing::warn!("reconciliation failed, will retry: {e}");
                self.emit(Event::ReconcileFailed {
                    error: e.to_string(),
                    at: Utc::now(),
                });
            }
        }
        result
    }

    pub async fn mark_eaten(&self) -> Result<MembershipView, CoreError> {
        let me = self.acting_member();
        if let Some(me) = &me {
            if me.is_away {
                return Err(ActionError::MemberAway.into());
            }
            if me.has_eaten {
                return Err(ActionError::AlreadyEaten.into());
            }
        }
        self.store.mark_eaten().await?;
        self.emit(Event::MealMarked {
            member_id: me.map(|m| m.id),
            at: Utc::now(),
        });
        self.refresh_members_after_action().await
    }

    pub async fn toggle_away(&self) -> Result<MembershipView, CoreError> {
        self.store.toggle_away().await?;
        self.emit(Event::AwayToggled {
            member_id: self.acting_member().map(|m| m.id),
            at: Utc::now(),
        });
        self.refresh_members_after_action().await
    }

    /// Report the shared meal as finished and return the end-of-period
    /// view (who ate, who missed it, ranking).
    pub async fn report_food_finished(&self) -> Result<MembershipView, CoreError> {
        if self.acting_member().is_some_and(|m| m.is_away) {
            return Err(ActionError::MemberAway.into());
        }
        self.reconciler.report_food_finished().await?;
        self.emit(Event::FoodFinishedReported { at: Utc::now() });
        self.refresh_members_after_action().await
    }

    pub async fn undo_food_finished(&self) -> Result<MembershipView, CoreError> {
        self.reconciler.undo_food_finished().await?;
        self.emit(Event::FoodFinishedUndone { at: Utc::now() });
        self.refresh_members_after_action().await
    }

    pub(crate) fn emit(&self, event: Event) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn refresh_members_after_action(&self) -> Result<MembershipView, CoreError> {
        match self.store.fetch_members().await {
            Ok(members) => self.set_members(members),
            Err(e) => tracing::warn!("refresh after action failed, showing last snapshot: {e}"),
        }
        Ok(self.view()?)
    }

    fn set_members(&self, members: Vec<Member>) {
        self.write_snapshot(|s| {
            s.members = members;
            s.members_fetched_at = Some(Utc::now());
        });
    }

    fn write_snapshot(&self, apply: impl FnOnce(&mut Snapshot)) {
        let mut snapshot = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        apply(&mut snapshot);
    }
}
