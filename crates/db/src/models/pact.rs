//! Pact entity model and DTOs.

use habits_core::pacts::{ConsequenceType, EndReason, PactStatus, PactType};
use habits_core::types::{DbId, Timestamp, UserId};
use serde::Serialize;
use sqlx::FromRow;

use super::pact_member::PactMember;

/// A row from the `pacts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pact {
    pub id: DbId,
    pub creator_user_id: UserId,
    pub partner_user_id: Option<UserId>,
    pub habit_goal_id: DbId,
    #[sqlx(try_from = "String")]
    pub pact_type: PactType,
    #[sqlx(try_from = "String")]
    pub status: PactStatus,
    pub duration_days: i32,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    #[sqlx(try_from = "String")]
    pub consequence_type: ConsequenceType,
    pub consequence_details: Option<serde_json::Value>,
    /// Stored as text; see [`Pact::end_reason`] for the typed value.
    #[sqlx(rename = "end_reason")]
    #[serde(rename = "endReason")]
    pub end_reason_raw: Option<String>,
    pub winner_id: Option<UserId>,
    pub creator_completion_rate: Option<f64>,
    pub partner_completion_rate: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Pact {
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason_raw.as_deref().and_then(|r| r.parse().ok())
    }
}

/// A pact joined with the headline fields of its habit goal, for listings.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PactWithGoal {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub pact: Pact,
    pub habit_goal_name: Option<String>,
    pub habit_goal_emoji: Option<String>,
    pub habit_goal_category: Option<String>,
}

/// A pact with its members, as returned by the detail endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PactWithMembers {
    #[serde(flatten)]
    pub pact: PactWithGoal,
    pub members: Vec<PactMember>,
}

/// Insert parameters for a pact. Status and dates are decided by the caller.
#[derive(Debug, Clone)]
pub struct NewPact {
    pub creator_user_id: UserId,
    pub partner_user_id: Option<UserId>,
    pub habit_goal_id: DbId,
    pub pact_type: PactType,
    pub status: PactStatus,
    pub duration_days: i32,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub consequence_type: ConsequenceType,
    pub consequence_details: Option<serde_json::Value>,
}

/// How a pact ended: terminal status plus the scoring the sweep computed.
#[derive(Debug, Clone, PartialEq)]
pub struct PactOutcome {
    pub status: PactStatus,
    pub end_reason: EndReason,
    pub winner_id: Option<UserId>,
    pub creator_completion_rate: Option<f64>,
    pub partner_completion_rate: Option<f64>,
}

impl PactOutcome {
    /// A terminal transition with no scoring attached.
    pub fn ended(status: PactStatus, end_reason: EndReason) -> Self {
        Self {
            status,
            end_reason,
            winner_id: None,
            creator_completion_rate: None,
            partner_completion_rate: None,
        }
    }
}
