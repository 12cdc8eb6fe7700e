//! Meal periods and the schedule that bounds them.
//!
//! The day is split into two windows on the 24-hour clock:
//!
//! ```text
//! 0 ........ lunch_start ........ dinner_start ........ 24
//!   dinner   |       lunch       |        dinner
//! ```
//!
//! Dinner is the wrap-around period; anything outside the lunch window
//! belongs to it.

pub mod clock;
pub mod detector;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

pub use clock::{Clock, FixedClock, SystemClock};
pub use detector::{detect, detect_at, occurrence_date};

/// One of the two daily meal windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealPeriod {
    Lunch,
    Dinner,
}

/// Label used on the wire and in local persistence before any period
/// has been recorded.
pub const NO_PERIOD: &str = "none";

impl MealPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealPeriod::Lunch => "lunch",
            MealPeriod::Dinner => "dinner",
        }
    }

    /// Status badge text shown while the period is active.
    pub fn headline(&self) -> &'static str {
        match self {
            MealPeriod::Lunch => "Lunch is ready",
            MealPeriod::Dinner => "Dinner is ready",
        }
    }

    /// Wire label for an optional recorded period (`none` when unset).
    pub fn label_of(period: Option<MealPeriod>) -> &'static str {
        period.map(|p| p.as_str()).unwrap_or(NO_PERIOD)
    }

    /// Inverse of [`MealPeriod::label_of`]. Returns `None` for unknown labels.
    pub fn parse_label(label: &str) -> Option<Option<MealPeriod>> {
        match label {
            NO_PERIOD => Some(None),
            "lunch" => Some(Some(MealPeriod::Lunch)),
            "dinner" => Some(Some(MealPeriod::Dinner)),
            _ => None,
        }
    }
}

impl fmt::Display for MealPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Period boundaries, whole hours on the 24-hour clock.
///
/// The detector does not require `lunch_start_hour < dinner_start_hour`;
/// an inverted schedule simply has an empty lunch window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSchedule")]
pub struct ScheduleConfig {
    lunch_start_hour: u8,
    dinner_start_hour: u8,
}

impl ScheduleConfig {
    pub fn new(lunch_start_hour: u32, dinner_start_hour: u32) -> Result<Self, ValidationError> {
        Ok(Self {
            lunch_start_hour: check_hour(lunch_start_hour)?,
            dinner_start_hour: check_hour(dinner_start_hour)?,
        })
    }

    /// Build from `HH:MM` strings as served by the store.
    pub fn from_times(lunch_time: &str, dinner_time: &str) -> Result<Self, ValidationError> {
        Self::new(parse_hour(lunch_time)?, parse_hour(dinner_time)?)
    }

    pub fn lunch_start_hour(&self) -> u8 {
        self.lunch_start_hour
    }

    pub fn dinner_start_hour(&self) -> u8 {
        self.dinner_start_hour
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            lunch_start_hour: 12,
            dinner_start_hour: 21,
        }
    }
}

#[derive(Deserialize)]
struct RawSchedule {
    lunch_start_hour: u32,
    dinner_start_hour: u32,
}

impl TryFrom<RawSchedule> for ScheduleConfig {
    type Error = ValidationError;

    fn try_from(raw: RawSchedule) -> Result<Self, Self::Error> {
        Self::new(raw.lunch_start_hour, raw.dinner_start_hour)
    }
}

fn check_hour(hour: u32) -> Result<u8, ValidationError> {
    if hour > 23 {
        return Err(ValidationError::HourOutOfRange(hour));
    }
    Ok(hour as u8)
}

/// Hour part of an `HH:MM` (or bare `HH`) string. Minutes are checked for
/// shape only; period selection ignores them.
fn parse_hour(time: &str) -> Result<u32, ValidationError> {
    let invalid = || ValidationError::InvalidTime(time.to_string());
    let mut parts = time.trim().splitn(2, ':');
    let hour = parts
        .next()
        .filter(|h| !h.is_empty())
        .and_then(|h| h.parse::<u32>().ok())
        .ok_or_else(invalid)?;
    if let Some(minutes) = parts.next() {
        match minutes.parse::<u32>() {
            Ok(m) if m < 60 => {}
            _ => return Err(invalid()),
        }
    }
    check_hour(hour)?;
    Ok(hour)
}
