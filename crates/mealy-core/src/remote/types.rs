//! Typed payloads exchanged with the remote status store.
//!
//! Field names follow the store's JSON (`_id`, `hasEaten`, ...). Everything
//! coming off the wire goes through [`parse_members`] / [`parse_schedule`]
//! so a malformed payload is rejected at the boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

use crate::error::{RemoteError, ValidationError};
use crate::period::{MealPeriod, ScheduleConfig};

/// A household member as served by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "hasEaten", default, deserialize_with = "null_as_default")]
    pub has_eaten: bool,
    #[serde(rename = "isAway", default, deserialize_with = "null_as_default")]
    pub is_away: bool,
    #[serde(rename = "missedMealsCount", default, deserialize_with = "null_as_default")]
    pub missed_meal_count: u32,
    #[serde(rename = "lastEatenAt", default)]
    pub last_eaten_at: Option<DateTime<Utc>>,
    #[serde(rename = "firebaseUid", default, skip_serializing_if = "Option::is_none")]
    pub auth_uid: Option<String>,
}

impl Member {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            has_eaten: false,
            is_away: false,
            missed_meal_count: 0,
            last_eaten_at: None,
            auth_uid: None,
        }
    }

    pub fn with_auth_uid(mut self, uid: impl Into<String>) -> Self {
        self.auth_uid = Some(uid.into());
        self
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Schedule as served by `GET /api/schedule`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleTimes {
    pub lunch_time: String,
    pub dinner_time: String,
}

/// Body of `POST /api/users/reset-eaten`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetRequest {
    pub previous_period: Option<MealPeriod>,
    pub new_period: MealPeriod,
    pub increment_missed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetBody<'a> {
    previous_meal_period: &'a str,
    new_meal_period: &'a str,
    increment_missed: bool,
}

impl ResetRequest {
    pub fn to_json(&self) -> serde_json::Value {
        let body = ResetBody {
            previous_meal_period: MealPeriod::label_of(self.previous_period),
            new_meal_period: self.new_period.as_str(),
            increment_missed: self.increment_missed,
        };
        serde_json::to_value(body).unwrap_or(serde_json::Value::Null)
    }
}

/// Reject empty ids/names and duplicate ids.
pub fn validate_members(members: &[Member]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(members.len());
    for member in members {
        if member.id.trim().is_empty() {
            return Err(ValidationError::MissingField {
                entity: "member".into(),
                field: "_id".into(),
            });
        }
        if member.display_name.trim().is_empty() {
            return Err(ValidationError::MissingField {
                entity: format!("member {}", member.id),
                field: "name".into(),
            });
        }
        if !seen.insert(member.id.as_str()) {
            return Err(ValidationError::DuplicateMember(member.id.clone()));
        }
    }
    Ok(())
}

/// Decode and validate a member list payload.
pub fn parse_members(payload: &str) -> Result<Vec<Member>, RemoteError> {
    let members: Vec<Member> = serde_json::from_str(payload)
        .map_err(|e| RemoteError::Malformed(format!("member list: {e}")))?;
    validate_members(&members)?;
    Ok(members)
}

/// Decode and validate a schedule payload.
pub fn parse_schedule(payload: &str) -> Result<ScheduleConfig, RemoteError> {
    let times: ScheduleTimes = serde_json::from_str(payload)
        .map_err(|e| RemoteError::Malformed(format!("schedule: {e}")))?;
    Ok(ScheduleConfig::from_times(&times.lunch_time, &times.dinner_time)?)
}
