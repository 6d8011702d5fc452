//! Pact member entity model and DTOs.

use habits_core::pacts::{CheckinTally, MemberRole, MemberStatus};
use habits_core::types::{DbId, Timestamp, UserId};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `pact_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PactMember {
    pub id: DbId,
    pub pact_id: DbId,
    pub user_id: UserId,
    #[sqlx(try_from = "String")]
    pub role: MemberRole,
    #[sqlx(try_from = "String")]
    pub status: MemberStatus,
    pub joined_at: Option<Timestamp>,
    pub left_at: Option<Timestamp>,
    pub total_checkins: i32,
    pub completed_checkins: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    /// Percentage, two decimals.
    pub completion_rate: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PactMember {
    pub fn tally(&self) -> CheckinTally {
        CheckinTally {
            completed: self.completed_checkins,
            total: self.total_checkins,
        }
    }
}

/// Insert parameters for a pact member.
#[derive(Debug, Clone)]
pub struct NewPactMember {
    pub pact_id: DbId,
    pub user_id: UserId,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub joined_at: Option<Timestamp>,
}
