//! Habit goal and checkin vocabulary.
//!
//! A habit goal carries a [`HabitSchedule`] that the streak rules in
//! [`crate::streaks`] evaluate; checkins record one dated attempt.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

string_enum! {
    /// How often a habit is expected to be completed.
    pub enum FrequencyType {
        Daily => "daily",
        Weekly => "weekly",
        /// Anything else; streak rules fall back to daily semantics.
        Custom => "custom",
    }
}

impl Default for FrequencyType {
    fn default() -> Self {
        Self::Daily
    }
}

string_enum! {
    /// Lifecycle of a single dated checkin.
    pub enum CheckinStatus {
        Pending => "pending",
        Completed => "completed",
        Skipped => "skipped",
        Missed => "missed",
    }
}

/// Default number of completions per frequency period.
pub const DEFAULT_FREQUENCY_COUNT: i32 = 1;

/// Default result cap for habit goal name searches.
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;

/// The scheduling settings of a habit goal, as seen by the streak rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitSchedule {
    pub frequency_type: FrequencyType,
    /// Completions expected per period. Weekly N-times habits get the whole
    /// week regardless of N.
    pub frequency_count: i32,
    /// Weekdays the habit is due, `0` = Sunday through `6` = Saturday.
    pub target_days_of_week: Vec<i16>,
}

impl HabitSchedule {
    pub fn daily() -> Self {
        Self {
            frequency_type: FrequencyType::Daily,
            frequency_count: DEFAULT_FREQUENCY_COUNT,
            target_days_of_week: Vec::new(),
        }
    }
}

/// Validate a list of target weekdays (`0..=6`, Sunday first).
pub fn validate_target_days(days: &[i16]) -> Result<(), CoreError> {
    if let Some(bad) = days.iter().find(|d| !(0..=6).contains(*d)) {
        return Err(CoreError::Validation(format!(
            "Invalid target day of week {bad}. Must be between 0 (Sunday) and 6 (Saturday)"
        )));
    }
    Ok(())
}

/// Validate a frequency count (must be at least one completion per period).
pub fn validate_frequency_count(count: i32) -> Result<(), CoreError> {
    if count < 1 {
        return Err(CoreError::Validation(
            "Frequency count must be at least 1".to_string(),
        ));
    }
    Ok(())
}
