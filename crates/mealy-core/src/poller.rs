//! Background polling: a fast fetch cycle and a slower reconcile cycle.
//!
//! Both timers are driven from one task so a session only ever runs one
//! cycle at a time. A failed cycle is logged and the loop keeps going.
//! Cancellation is observed between cycles, never in the middle of one.

use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::events::Event;
use crate::reconciler::ReconcileOutcome;
use crate::session::MealSession;

const DEFAULT_FETCH_INTERVAL_SECS: u64 = 30;
const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 60;
/// Floor for both intervals; `tokio::time::interval` rejects zero.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub fetch_interval: Duration,
    pub reconcile_interval: Duration,
}

impl PollerConfig {
    /// Raise any interval below [`MIN_INTERVAL`] to it.
    pub fn clamped(self) -> Self {
        Self {
            fetch_interval: self.fetch_interval.max(MIN_INTERVAL),
            reconcile_interval: self.reconcile_interval.max(MIN_INTERVAL),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            fetch_interval: Duration::from_secs(DEFAULT_FETCH_INTERVAL_SECS),
            reconcile_interval: Duration::from_secs(DEFAULT_RECONCILE_INTERVAL_SECS),
        }
    }
}

pub struct Poller {
    session: Arc<MealSession>,
    config: PollerConfig,
}

/// Running poller. Dropping the handle does not stop the task; call
/// [`PollerHandle::shutdown`] or cancel the token.
pub struct PollerHandle {
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
}

impl Poller {
    pub fn new(session: Arc<MealSession>, config: PollerConfig) -> Self {
        let clamped = config.clamped();
        if clamped != config {
            tracing::warn!("poller interval below {}s raised to the minimum", MIN_INTERVAL.as_secs());
        }
        Self {
            session,
            config: clamped,
        }
    }

    pub fn spawn(self) -> PollerHandle {
        self.spawn_with_token(CancellationToken::new())
    }

    /// Spawn on the current runtime, stopping when `cancel_token` fires.
    pub fn spawn_with_token(self, cancel_token: CancellationToken) -> PollerHandle {
        let task = tokio::spawn(poll_loop(
            self.session,
            self.config,
            cancel_token.clone(),
        ));
        PollerHandle { cancel_token, task }
    }
}

impl PollerHandle {
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel and wait for the in-flight cycle, if any, to finish.
    pub async fn shutdown(self) {
        self.cancel_token.cancel();
        if let Err(e) = self.task.await {
            tracing::error!("poller task ended abnormally: {e}");
        }
    }
}

async fn poll_loop(session: Arc<MealSession>, config: PollerConfig, cancel_token: CancellationToken) {
    let mut fetch_ticker = tokio::time::interval(config.fetch_interval);
    fetch_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut reconcile_ticker = tokio::time::interval(config.reconcile_interval);
    reconcile_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        "poller started: fetch every {}s, reconcile every {}s",
        config.fetch_interval.as_secs(),
        config.reconcile_interval.as_secs()
    );

    loop {
        tokio::select! {
            // Fetch first on a shared tick so reconciliation sees the
            // freshest schedule.
            biased;
            _ = cancel_token.cancelled() => {
                tracing::info!("poller shutting down");
                break;
            }
            _ = fetch_ticker.tick() => {
                if let Err(e) = session.refresh().await {
                    tracing::debug!("fetch cycle incomplete: {e}");
                }
            }
            _ = reconcile_ticker.tick() => {
                match session.reconcile().await {
                    Ok(ReconcileOutcome::Unchanged(period)) => {
                        tracing::trace!("period unchanged: {period}");
                    }
                    Ok(_) => {}
                    Err(e) if e.is_transient() => {
                        tracing::debug!("reconcile cycle failed, retrying next tick: {e}");
                    }
                    Err(e) => tracing::error!("reconcile cycle failed: {e}"),
                }
            }
        }
    }

    session.emit(Event::PollerStopped { at: Utc::now() });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::{FixedClock, MealPeriod, ScheduleConfig};
    use crate::remote::{Household, InMemoryStatusStore};
    use crate::storage::MemoryStore;

    fn session_at(hour: u8) -> (Arc<MealSession>, InMemoryStatusStore, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::at_hour(hour));
        let store = InMemoryStatusStore::with_clock(Household::demo(), clock.clone());
        let session = MealSession::new(Arc::new(store.clone()), Arc::new(MemoryStore::new()))
            .with_clock(clock.clone())
            .with_schedule(ScheduleConfig::default());
        (Arc::new(session), store, clock)
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn default_intervals() {
        let config = PollerConfig::default();
        assert_eq!(config.fetch_interval, Duration::from_secs(30));
        assert_eq!(config.reconcile_interval, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn runs_both_cycles_on_their_own_intervals() {
        let (session, store, clock) = session_at(13);
        let mut rx = session.subscribe();
        let handle = Poller::new(session.clone(), PollerConfig::default()).spawn();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.reset_calls(), 1);
        assert_eq!(session.period_state().await.current_period, Some(MealPeriod::Lunch));
        assert_eq!(session.snapshot().members.len(), 4);

        clock.set_hour(22);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(store.reset_calls(), 2);
        assert_eq!(session.period_state().await.current_period, Some(MealPeriod::Dinner));

        handle.shutdown().await;
        let events = drain(&mut rx);
        let refreshes = events
            .iter()
            .filter(|e| matches!(e, Event::SnapshotRefreshed { .. }))
            .count();
        let changes = events
            .iter()
            .filter(|e| matches!(e, Event::PeriodChanged { .. }))
            .count();
        assert_eq!(refreshes, 3);
        assert_eq!(changes, 2);
        assert!(matches!(events.last(), Some(Event::PollerStopped { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_intervals_are_clamped_instead_of_panicking() {
        let (session, _store, _clock) = session_at(13);
        let mut rx = session.subscribe();
        let config = PollerConfig {
            fetch_interval: Duration::ZERO,
            reconcile_interval: Duration::ZERO,
        };
        assert_eq!(
            config.clamped(),
            PollerConfig {
                fetch_interval: MIN_INTERVAL,
                reconcile_interval: MIN_INTERVAL,
            }
        );
        let handle = Poller::new(session.clone(), config).spawn();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(!handle.is_finished());
        handle.shutdown().await;

        let events = drain(&mut rx);
        let refreshes = events
            .iter()
            .filter(|e| matches!(e, Event::SnapshotRefreshed { .. }))
            .count();
        assert_eq!(refreshes, 3);
        assert!(matches!(events.last(), Some(Event::PollerStopped { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_stop_the_loop() {
        let (session, store, _clock) = session_at(13);
        store.set_unreachable(true);
        let handle = Poller::new(session.clone(), PollerConfig::default()).spawn();

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(!handle.is_finished());
        assert_eq!(session.period_state().await.current_period, None);

        store.set_unreachable(false);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(session.period_state().await.current_period, Some(MealPeriod::Lunch));
        assert_eq!(session.snapshot().members.len(), 4);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn external_token_stops_the_poller() {
        let (session, _store, _clock) = session_at(13);
        let token = CancellationToken::new();
        let handle = Poller::new(session, PollerConfig::default()).spawn_with_token(token.clone());

        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(handle.is_finished());
    }
}
