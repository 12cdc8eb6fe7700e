//! Period detection: which meal window a wall-clock hour falls into.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Timelike};

use super::{MealPeriod, ScheduleConfig};

/// Lunch iff `lunch_start <= hour < dinner_start`, dinner otherwise.
pub fn detect(hour: u8, schedule: &ScheduleConfig) -> MealPeriod {
    if hour >= schedule.lunch_start_hour() && hour < schedule.dinner_start_hour() {
        MealPeriod::Lunch
    } else {
        MealPeriod::Dinner
    }
}

/// Detect using the hour of a timestamp in its own timezone.
pub fn detect_at<Tz: TimeZone>(at: &DateTime<Tz>, schedule: &ScheduleConfig) -> MealPeriod {
    detect(at.hour() as u8, schedule)
}

/// Calendar date on which the occurrence of `period` active at `now` began.
///
/// Dinner wraps past midnight, so the small hours still belong to the
/// previous day's dinner. Used to key one reset per period occurrence.
pub fn occurrence_date(now: NaiveDateTime, schedule: &ScheduleConfig, period: MealPeriod) -> NaiveDate {
    let today = now.date();
    let before_dinner = now.hour() < u32::from(schedule.dinner_start_hour());
    if period == MealPeriod::Dinner && before_dinner {
        today.pred_opt().unwrap_or(today)
    } else {
        today
    }
}
