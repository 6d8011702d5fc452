//! Repository for the `pact_members` table.

use habits_core::types::{DbId, Timestamp, UserId};
use sqlx::PgPool;

use crate::models::pact_member::{NewPactMember, PactMember};

/// Column list for `pact_members` queries.
const COLUMNS: &str = "id, pact_id, user_id, role, status, joined_at, left_at, total_checkins, \
    completed_checkins, current_streak, longest_streak, completion_rate, created_at, updated_at";

/// Provides membership operations for pacts.
pub struct PactMemberRepo;

impl PactMemberRepo {
    pub async fn create(pool: &PgPool, input: &NewPactMember) -> Result<PactMember, sqlx::Error> {
        let query = format!(
            "INSERT INTO pact_members (pact_id, user_id, role, status, joined_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PactMember>(&query)
            .bind(input.pact_id)
            .bind(input.user_id)
            .bind(input.role.as_str())
            .bind(input.status.as_str())
            .bind(input.joined_at)
            .fetch_one(pool)
            .await
    }

    /// Members of a pact, creator first.
    pub async fn list_by_pact(pool: &PgPool, pact_id: DbId) -> Result<Vec<PactMember>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pact_members WHERE pact_id = $1 ORDER BY role ASC"
        );
        sqlx::query_as::<_, PactMember>(&query)
            .bind(pact_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_pact_and_user(
        pool: &PgPool,
        pact_id: DbId,
        user_id: UserId,
    ) -> Result<Option<PactMember>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pact_members WHERE pact_id = $1 AND user_id = $2"
        );
        sqlx::query_as::<_, PactMember>(&query)
            .bind(pact_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn activate(
        pool: &PgPool,
        pact_id: DbId,
        user_id: UserId,
        joined_at: Timestamp,
    ) -> Result<Option<PactMember>, sqlx::Error> {
        let query = format!(
            "UPDATE pact_members SET status = 'active', joined_at = $3, updated_at = NOW() \
             WHERE pact_id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PactMember>(&query)
            .bind(pact_id)
            .bind(user_id)
            .bind(joined_at)
            .fetch_optional(pool)
            .await
    }

    pub async fn leave(
        pool: &PgPool,
        pact_id: DbId,
        user_id: UserId,
        left_at: Timestamp,
    ) -> Result<Option<PactMember>, sqlx::Error> {
        let query = format!(
            "UPDATE pact_members SET status = 'left', left_at = $3, updated_at = NOW() \
             WHERE pact_id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PactMember>(&query)
            .bind(pact_id)
            .bind(user_id)
            .bind(left_at)
            .fetch_optional(pool)
            .await
    }

    /// Bump the checkin counters and recompute the derived columns in one
    /// statement. The right-hand sides see the pre-update row.
    pub async fn record_checkin(
        pool: &PgPool,
        member_id: DbId,
        completed: bool,
        current_streak: Option<i32>,
    ) -> Result<Option<PactMember>, sqlx::Error> {
        let query = format!(
            "UPDATE pact_members SET \
                total_checkins = total_checkins + 1, \
                completed_checkins = completed_checkins + $2::INT, \
                completion_rate = ROUND(((completed_checkins + $2::INT)::NUMERIC \
                    / (total_checkins + 1)::NUMERIC) * 100, 2)::DOUBLE PRECISION, \
                current_streak = COALESCE($3, current_streak), \
                longest_streak = GREATEST(longest_streak, COALESCE($3, current_streak)), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PactMember>(&query)
            .bind(member_id)
            .bind(i32::from(completed))
            .bind(current_streak)
            .fetch_optional(pool)
            .await
    }
}
