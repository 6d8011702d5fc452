//! Streak and streak history models.

use habits_core::streaks::{StreakEventType, StreakState};
use habits_core::types::{Date, DbId, Timestamp, UserId};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `streaks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    pub id: DbId,
    pub user_id: UserId,
    pub habit_goal_id: DbId,
    pub pact_id: Option<DbId>,
    pub current_streak: i32,
    pub current_streak_start_date: Option<Date>,
    pub longest_streak: i32,
    pub longest_streak_start_date: Option<Date>,
    pub longest_streak_end_date: Option<Date>,
    pub last_completed_date: Option<Date>,
    pub grace_period_days: i32,
    pub grace_days_used: i32,
    /// Most recent day forgiven by a grace day.
    pub last_grace_date: Option<Date>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Streak {
    /// The counters the streak rules operate on.
    pub fn state(&self) -> StreakState {
        StreakState {
            current_streak: self.current_streak,
            current_streak_start_date: self.current_streak_start_date,
            longest_streak: self.longest_streak,
            longest_streak_start_date: self.longest_streak_start_date,
            longest_streak_end_date: self.longest_streak_end_date,
            last_completed_date: self.last_completed_date,
            grace_days_used: self.grace_days_used,
            grace_covered_date: self.last_grace_date,
        }
    }

    /// Copy `state` back onto the row.
    pub fn apply(&mut self, state: &StreakState) {
        self.current_streak = state.current_streak;
        self.current_streak_start_date = state.current_streak_start_date;
        self.longest_streak = state.longest_streak;
        self.longest_streak_start_date = state.longest_streak_start_date;
        self.longest_streak_end_date = state.longest_streak_end_date;
        self.last_completed_date = state.last_completed_date;
        self.grace_days_used = state.grace_days_used;
        self.last_grace_date = state.grace_covered_date;
    }
}

/// Insert parameters for a streak; counters start at zero.
#[derive(Debug, Clone)]
pub struct NewStreak {
    pub user_id: UserId,
    pub habit_goal_id: DbId,
    pub pact_id: Option<DbId>,
    pub grace_period_days: i32,
}

/// A row from the append-only `streak_history` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakHistory {
    pub id: DbId,
    pub streak_id: DbId,
    pub user_id: UserId,
    pub checkin_id: Option<DbId>,
    #[sqlx(try_from = "String")]
    pub event_type: StreakEventType,
    pub event_date: Date,
    pub streak_before: i32,
    pub streak_after: i32,
    pub milestone_reached: Option<i32>,
    pub created_at: Timestamp,
}

/// Insert parameters for a history entry.
#[derive(Debug, Clone)]
pub struct NewStreakHistory {
    pub streak_id: DbId,
    pub user_id: UserId,
    pub checkin_id: Option<DbId>,
    pub event_type: StreakEventType,
    pub event_date: Date,
    pub streak_before: i32,
    pub streak_after: i32,
    pub milestone_reached: Option<i32>,
}
