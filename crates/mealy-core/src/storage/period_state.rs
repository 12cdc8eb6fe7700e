//! Persisted period/override state.

use serde::{Deserialize, Serialize};

use super::LocalPersistence;
use crate::error::StorageError;
use crate::period::MealPeriod;

pub const CURRENT_PERIOD_KEY: &str = "currentMealPeriod";
pub const FOOD_FINISHED_KEY: &str = "foodFinishedOverride";

/// Last period this process reconciled, and whether food was reported
/// finished since.
///
/// `current_period == None` only before the first successful
/// reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodState {
    pub current_period: Option<MealPeriod>,
    pub food_finished_override: bool,
}

impl PeriodState {
    /// Read both keys. Missing keys mean the defaults.
    ///
    /// # Errors
    /// Returns [`StorageError::CorruptValue`] for an unknown period label
    /// or a non-boolean override value.
    pub fn load(store: &dyn LocalPersistence) -> Result<Self, StorageError> {
        let current_period = match store.get(CURRENT_PERIOD_KEY)? {
            None => None,
            Some(label) => {
                MealPeriod::parse_label(&label).ok_or_else(|| StorageError::CorruptValue {
                    key: CURRENT_PERIOD_KEY.to_string(),
                    value: label.clone(),
                })?
            }
        };

        let food_finished_override = match store.get(FOOD_FINISHED_KEY)?.as_deref() {
            None | Some("false") => false,
            Some("true") => true,
            Some(other) => {
                return Err(StorageError::CorruptValue {
                    key: FOOD_FINISHED_KEY.to_string(),
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            current_period,
            food_finished_override,
        })
    }

    /// Write both keys. A cleared override removes its key.
    pub fn save(&self, store: &dyn LocalPersistence) -> Result<(), StorageError> {
        store.set(CURRENT_PERIOD_KEY, MealPeriod::label_of(self.current_period))?;
        if self.food_finished_override {
            store.set(FOOD_FINISHED_KEY, "true")?;
        } else {
            store.remove(FOOD_FINISHED_KEY)?;
        }
        Ok(())
    }
}
