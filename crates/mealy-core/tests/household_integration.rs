//! Whole-household scenarios against the in-memory status store.
//!
//! Each test wires a [`MealSession`] to an [`InMemoryStatusStore`] driven
//! by a fixed clock, so period boundaries are crossed deterministically.

use async_trait::async_trait;
use mealy_core::error::{ActionError, CoreError, RemoteError};
use mealy_core::remote::{Household, ResetRequest};
use mealy_core::{
    Database, FixedClock, InMemoryStatusStore, LocalPersistence, MealPeriod, MealSession, Member,
    MemoryStore, PeriodState, ReconcileOutcome, ScheduleConfig, StatusStore,
};
use std::sync::Arc;

// ============================================================================
// Helpers
// ============================================================================

struct Fixture {
    store: InMemoryStatusStore,
    clock: Arc<FixedClock>,
}

impl Fixture {
    fn at_hour(hour: u8) -> Self {
        let clock = Arc::new(FixedClock::at_hour(hour));
        let store = InMemoryStatusStore::with_clock(Household::demo(), clock.clone());
        Self { store, clock }
    }

    fn session(&self, uid: &str, persistence: Arc<dyn LocalPersistence>) -> MealSession {
        MealSession::new(Arc::new(self.store.acting_as(uid)), persistence)
            .with_clock(self.clock.clone())
            .with_schedule(ScheduleConfig::default())
            .with_member_uid(Some(uid.to_string()))
    }

    fn missed(&self, id: &str) -> u32 {
        self.store
            .household()
            .member(id)
            .map(|m| m.missed_meal_count)
            .unwrap_or_default()
    }
}

fn lunch_recorded() -> Arc<MemoryStore> {
    let persistence = Arc::new(MemoryStore::new());
    PeriodState {
        current_period: Some(MealPeriod::Lunch),
        food_finished_override: false,
    }
    .save(persistence.as_ref())
    .unwrap();
    persistence
}

// ============================================================================
// Transitions
// ============================================================================

#[tokio::test]
async fn dinner_transition_counts_unfed_present_members() {
    let fx = Fixture::at_hour(13);
    let session = fx.session("asha", lunch_recorded());
    session.refresh().await.unwrap();
    session.mark_eaten().await.unwrap();

    fx.clock.set_hour(21);
    let outcome = session.reconcile().await.unwrap();
    assert!(matches!(
        outcome,
        ReconcileOutcome::Transitioned {
            from: Some(MealPeriod::Lunch),
            to: MealPeriod::Dinner,
            increment_missed: true,
            ..
        }
    ));

    assert_eq!(fx.missed("asha"), 0);
    assert_eq!(fx.missed("ben"), 1);
    assert_eq!(fx.missed("chidi"), 1);
    assert_eq!(fx.missed("dana"), 1);

    let view = session.view().unwrap();
    assert_eq!(view.waiting.len(), 4);
    assert!(view.eaten.is_empty());
    assert_eq!(session.period_state().await.current_period, Some(MealPeriod::Dinner));
}

#[tokio::test]
async fn away_members_are_never_counted() {
    let fx = Fixture::at_hour(13);
    fx.store.acting_as("ben").toggle_away().await.unwrap();
    let session = fx.session("asha", lunch_recorded());

    fx.clock.set_hour(22);
    session.reconcile().await.unwrap();

    assert_eq!(fx.missed("ben"), 0);
    assert_eq!(fx.missed("asha"), 1);
    let view = session.view().unwrap();
    assert_eq!(view.away.len(), 1);
    assert!(view.ranking.iter().all(|r| r.member_id != "ben"));
}

#[tokio::test]
async fn two_clients_crossing_the_same_boundary_count_once() {
    let fx = Fixture::at_hour(13);
    let first = fx.session("asha", lunch_recorded());
    let second = fx.session("ben", lunch_recorded());

    fx.clock.set_hour(21);
    first.reconcile().await.unwrap();
    second.reconcile().await.unwrap();

    assert_eq!(fx.store.reset_calls(), 2);
    assert_eq!(fx.missed("chidi"), 1);
    assert_eq!(
        second.period_state().await.current_period,
        Some(MealPeriod::Dinner)
    );
}

#[tokio::test]
async fn restart_with_on_disk_state_does_not_repeat_transition() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("mealy.db");
    let fx = Fixture::at_hour(21);

    {
        let db = Arc::new(Database::open_at(&db_path).unwrap());
        let session = fx.session("asha", db);
        session.reconcile().await.unwrap();
    }

    let db = Arc::new(Database::open_at(&db_path).unwrap());
    let restarted = fx.session("asha", db);
    let outcome = restarted.reconcile().await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Unchanged(MealPeriod::Dinner));
    assert_eq!(fx.store.reset_calls(), 1);
}

#[tokio::test]
async fn unreachable_store_is_retried_until_applied() {
    let fx = Fixture::at_hour(13);
    let session = fx.session("asha", lunch_recorded());
    fx.clock.set_hour(21);
    fx.store.set_unreachable(true);

    assert!(session.reconcile().await.is_err());
    assert!(session.reconcile().await.is_err());
    assert_eq!(session.period_state().await.current_period, Some(MealPeriod::Lunch));

    fx.store.set_unreachable(false);
    session.reconcile().await.unwrap();
    assert_eq!(session.period_state().await.current_period, Some(MealPeriod::Dinner));
    assert_eq!(fx.missed("dana"), 1);
}

// ============================================================================
// Food-finished override
// ============================================================================

#[tokio::test]
async fn food_finished_suppresses_missed_counting_once() {
    let fx = Fixture::at_hour(13);
    let session = fx.session("asha", lunch_recorded());
    session.refresh().await.unwrap();

    let view = session.report_food_finished().await.unwrap();
    assert_eq!(view.waiting.len(), 4);
    assert!(session.period_state().await.food_finished_override);

    fx.clock.set_hour(21);
    let outcome = session.reconcile().await.unwrap();
    assert!(matches!(
        outcome,
        ReconcileOutcome::Transitioned {
            increment_missed: false,
            ..
        }
    ));
    assert!(["asha", "ben", "chidi", "dana"].iter().all(|id| fx.missed(id) == 0));

    let state = session.period_state().await;
    assert!(!state.food_finished_override);
    assert!(!fx.store.household().food_finished);

    // Override was consumed: the next boundary counts again.
    fx.clock.advance(chrono::Duration::hours(16));
    session.reconcile().await.unwrap();
    assert_eq!(fx.missed("asha"), 1);
}

#[tokio::test]
async fn undo_restores_normal_counting() {
    let fx = Fixture::at_hour(13);
    let session = fx.session("asha", lunch_recorded());
    session.refresh().await.unwrap();
    session.mark_eaten().await.unwrap();
    let before = fx.store.household().members;
    let view_before = session.view().unwrap();

    session.report_food_finished().await.unwrap();
    let view = session.undo_food_finished().await.unwrap();
    assert!(!session.period_state().await.food_finished_override);
    assert!(!fx.store.household().food_finished);

    // Report plus undo leaves counts and eaten flags exactly as they were.
    assert_eq!(fx.store.household().members, before);
    assert_eq!(view, view_before);
    assert_eq!(view.eaten.len(), 1);
    assert_eq!(view.eaten[0].id, "asha");
    assert_eq!(view.waiting.len(), 3);

    fx.clock.set_hour(21);
    session.reconcile().await.unwrap();
    assert_eq!(fx.missed("chidi"), 1);
}

#[tokio::test]
async fn second_report_in_same_period_is_rejected() {
    let fx = Fixture::at_hour(13);
    let session = fx.session("asha", lunch_recorded());
    session.refresh().await.unwrap();

    session.report_food_finished().await.unwrap();
    let err = session.report_food_finished().await.unwrap_err();
    assert!(matches!(err, CoreError::Action(ActionError::OverrideActive)));
}

// ============================================================================
// Member action guards
// ============================================================================

#[tokio::test]
async fn away_member_cannot_eat_or_report() {
    let fx = Fixture::at_hour(13);
    fx.store.acting_as("ben").toggle_away().await.unwrap();
    let session = fx.session("ben", lunch_recorded());
    session.refresh().await.unwrap();

    let err = session.mark_eaten().await.unwrap_err();
    assert!(matches!(err, CoreError::Action(ActionError::MemberAway)));
    let err = session.report_food_finished().await.unwrap_err();
    assert!(matches!(err, CoreError::Action(ActionError::MemberAway)));
    assert!(!fx.store.household().food_finished);
}

#[tokio::test]
async fn eating_twice_is_rejected() {
    let fx = Fixture::at_hour(13);
    let session = fx.session("chidi", lunch_recorded());
    session.refresh().await.unwrap();

    let view = session.mark_eaten().await.unwrap();
    assert_eq!(view.eaten.len(), 1);
    let err = session.mark_eaten().await.unwrap_err();
    assert!(matches!(err, CoreError::Action(ActionError::AlreadyEaten)));
}

#[tokio::test]
async fn toggling_away_moves_member_between_partitions() {
    let fx = Fixture::at_hour(13);
    let session = fx.session("dana", lunch_recorded());
    session.refresh().await.unwrap();

    let view = session.toggle_away().await.unwrap();
    assert_eq!(view.away.len(), 1);
    assert_eq!(view.ranking.len(), 3);

    let view = session.toggle_away().await.unwrap();
    assert!(view.away.is_empty());
    assert_eq!(view.ranking.len(), 4);
}

#[tokio::test]
async fn status_report_reflects_session() {
    let fx = Fixture::at_hour(19);
    let session = fx.session("asha", Arc::new(MemoryStore::new()));
    session.refresh().await.unwrap();

    let report = session.status_report().await.unwrap();
    assert_eq!(report.period, MealPeriod::Lunch);
    assert_eq!(report.headline, "Lunch is ready");
    assert_eq!(report.recorded_period, None);
    assert_eq!(report.me.map(|m| m.id), Some("asha".to_string()));
    assert!(report.my_eligibility.unwrap().can_mark_eaten);
}

// ============================================================================
// Partial outages
// ============================================================================

/// Serves members normally while the schedule endpoint is down.
struct ScheduleDown {
    inner: InMemoryStatusStore,
}

#[async_trait]
impl StatusStore for ScheduleDown {
    fn name(&self) -> &str {
        "schedule-down"
    }

    async fn fetch_members(&self) -> Result<Vec<Member>, RemoteError> {
        self.inner.fetch_members().await
    }

    async fn fetch_schedule(&self) -> Result<ScheduleConfig, RemoteError> {
        Err(RemoteError::Http {
            endpoint: "/api/schedule".into(),
            status: 502,
            body: "bad gateway".into(),
        })
    }

    async fn reset_eaten(&self, request: &ResetRequest) -> Result<(), RemoteError> {
        self.inner.reset_eaten(request).await
    }

    async fn mark_eaten(&self) -> Result<(), RemoteError> {
        self.inner.mark_eaten().await
    }

    async fn toggle_away(&self) -> Result<(), RemoteError> {
        self.inner.toggle_away().await
    }

    async fn report_food_finished(&self) -> Result<(), RemoteError> {
        self.inner.report_food_finished().await
    }

    async fn undo_food_finished(&self) -> Result<(), RemoteError> {
        self.inner.undo_food_finished().await
    }
}

#[tokio::test]
async fn schedule_outage_does_not_block_member_actions() {
    let fx = Fixture::at_hour(13);
    let store = ScheduleDown {
        inner: fx.store.acting_as("ben"),
    };
    let session = MealSession::new(Arc::new(store), lunch_recorded())
        .with_clock(fx.clock.clone())
        .with_schedule(ScheduleConfig::default())
        .with_member_uid(Some("ben".to_string()));

    let err = session.refresh().await.unwrap_err();
    assert!(err.is_transient());
    // Members still landed and the last known schedule was kept.
    assert_eq!(session.snapshot().members.len(), 4);
    assert_eq!(session.schedule(), ScheduleConfig::default());

    session.refresh_members().await.unwrap();
    let view = session.mark_eaten().await.unwrap();
    assert_eq!(view.eaten.len(), 1);
    let view = session.toggle_away().await.unwrap();
    assert_eq!(view.away.len(), 1);
}

#[tokio::test]
async fn member_outage_fails_member_refresh() {
    let fx = Fixture::at_hour(13);
    let session = fx.session("ben", lunch_recorded());
    fx.store.set_unreachable(true);
    assert!(session.refresh_members().await.is_err());
    assert!(session.snapshot().members.is_empty());
}

// ============================================================================
// Schedule changes
// ============================================================================

#[tokio::test]
async fn fetched_schedule_drives_the_next_transition() {
    let fx = Fixture::at_hour(15);
    let session = fx.session("asha", lunch_recorded());
    session.refresh().await.unwrap();
    assert_eq!(session.current_period(), MealPeriod::Lunch);
    assert_eq!(
        session.reconcile().await.unwrap(),
        ReconcileOutcome::Unchanged(MealPeriod::Lunch)
    );

    // Household moves dinner to 14:00; 15:00 is now dinner.
    fx.store.set_schedule(ScheduleConfig::new(10, 14).unwrap());
    session.refresh().await.unwrap();
    assert_eq!(session.schedule(), ScheduleConfig::new(10, 14).unwrap());
    assert_eq!(session.current_period(), MealPeriod::Dinner);

    let outcome = session.reconcile().await.unwrap();
    assert!(matches!(
        outcome,
        ReconcileOutcome::Transitioned {
            from: Some(MealPeriod::Lunch),
            to: MealPeriod::Dinner,
            ..
        }
    ));
    assert_eq!(fx.store.reset_calls(), 1);
    assert_eq!(fx.missed("ben"), 1);
}
