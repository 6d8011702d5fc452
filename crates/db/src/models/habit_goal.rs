//! Habit goal entity model and DTOs.

use habits_core::habits::{FrequencyType, HabitSchedule};
use habits_core::types::{DbId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `habit_goals` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitGoal {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub emoji: Option<String>,
    #[sqlx(try_from = "String")]
    pub frequency_type: FrequencyType,
    pub frequency_count: i32,
    pub target_days_of_week: Vec<i16>,
    /// `None` for system templates.
    pub created_by_user_id: Option<UserId>,
    pub is_template: bool,
    pub is_public: bool,
    pub usage_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl HabitGoal {
    pub fn schedule(&self) -> HabitSchedule {
        HabitSchedule {
            frequency_type: self.frequency_type,
            frequency_count: self.frequency_count,
            target_days_of_week: self.target_days_of_week.clone(),
        }
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.created_by_user_id == Some(user_id)
    }
}

/// Insert parameters for a habit goal, with defaults already resolved.
#[derive(Debug, Clone, Default)]
pub struct NewHabitGoal {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub emoji: Option<String>,
    pub frequency_type: FrequencyType,
    pub frequency_count: i32,
    pub target_days_of_week: Vec<i16>,
    pub created_by_user_id: Option<UserId>,
    pub is_template: bool,
    pub is_public: bool,
}

/// DTO for updating a habit goal. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHabitGoal {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub emoji: Option<String>,
    pub frequency_type: Option<FrequencyType>,
    pub frequency_count: Option<i32>,
    pub target_days_of_week: Option<Vec<i16>>,
    pub is_public: Option<bool>,
}
