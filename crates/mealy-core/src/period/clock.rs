//! Wall-clock source for period detection.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, Timelike};
use std::sync::Mutex;

/// Supplies local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// Hour of day, 0-23.
    fn current_hour(&self) -> u8 {
        self.now().hour() as u8
    }
}

/// Local time of the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Settable clock for tests and simulations.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self { now: Mutex::new(at) }
    }

    /// 2024-01-15 at `hour`:00.
    pub fn at_hour(hour: u8) -> Self {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default();
        Self::new(date.and_hms_opt(u32::from(hour % 24), 0, 0).unwrap_or_default())
    }

    /// Move to `hour`:00 on the current date.
    pub fn set_hour(&self, hour: u8) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(at) = now.date().and_hms_opt(u32::from(hour % 24), 0, 0) {
            *now = at;
        }
    }

    pub fn set(&self, at: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
