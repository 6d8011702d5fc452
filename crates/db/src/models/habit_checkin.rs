//! Habit checkin entity model and DTOs.

use habits_core::habits::CheckinStatus;
use habits_core::types::{Date, DbId, Timestamp, UserId};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `habit_checkins` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitCheckin {
    pub id: DbId,
    pub user_id: UserId,
    pub pact_id: Option<DbId>,
    pub habit_goal_id: DbId,
    pub scheduled_date: Date,
    #[sqlx(try_from = "String")]
    pub status: CheckinStatus,
    pub completed_at: Option<Timestamp>,
    pub notes: Option<String>,
    pub self_rating: Option<i16>,
    pub difficulty_rating: Option<i16>,
    pub has_proof: bool,
    pub proof_verified: bool,
    pub contributed_to_streak: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Create-or-update parameters keyed by (user, habit goal, scheduled date).
///
/// On conflict the status, notes, ratings and proof flag are overwritten;
/// `completed_at` keeps its first value while the checkin stays completed.
#[derive(Debug, Clone)]
pub struct UpsertCheckin {
    pub user_id: UserId,
    pub habit_goal_id: DbId,
    pub pact_id: Option<DbId>,
    pub scheduled_date: Date,
    pub status: CheckinStatus,
    pub completed_at: Option<Timestamp>,
    pub notes: Option<String>,
    pub self_rating: Option<i16>,
    pub difficulty_rating: Option<i16>,
    pub has_proof: bool,
}

/// Partial update of a checkin. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct CheckinChanges {
    pub status: Option<CheckinStatus>,
    pub completed_at: Option<Timestamp>,
    pub notes: Option<String>,
    pub self_rating: Option<i16>,
    pub difficulty_rating: Option<i16>,
    pub has_proof: Option<bool>,
    pub contributed_to_streak: Option<bool>,
}
