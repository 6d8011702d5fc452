//! Repository for the `pacts` table.

use habits_core::pacts::PactStatus;
use habits_core::types::{DbId, Timestamp, UserId};
use sqlx::PgPool;

use crate::models::pact::{NewPact, Pact, PactOutcome, PactWithGoal};

/// Column list for `pacts` queries.
const COLUMNS: &str = "id, creator_user_id, partner_user_id, habit_goal_id, pact_type, status, \
    duration_days, start_date, end_date, consequence_type, consequence_details, end_reason, \
    winner_id, creator_completion_rate, partner_completion_rate, created_at, updated_at";

/// Pact columns qualified for the habit goal join.
const JOINED_COLUMNS: &str = "p.id, p.creator_user_id, p.partner_user_id, p.habit_goal_id, \
    p.pact_type, p.status, p.duration_days, p.start_date, p.end_date, p.consequence_type, \
    p.consequence_details, p.end_reason, p.winner_id, p.creator_completion_rate, \
    p.partner_completion_rate, p.created_at, p.updated_at, \
    g.name AS habit_goal_name, g.emoji AS habit_goal_emoji, g.category AS habit_goal_category";

/// Provides CRUD and lifecycle operations for pacts.
pub struct PactRepo;

impl PactRepo {
    pub async fn create(pool: &PgPool, input: &NewPact) -> Result<Pact, sqlx::Error> {
        let query = format!(
            "INSERT INTO pacts \
                (creator_user_id, partner_user_id, habit_goal_id, pact_type, status, \
                 duration_days, start_date, end_date, consequence_type, consequence_details) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Pact>(&query)
            .bind(input.creator_user_id)
            .bind(input.partner_user_id)
            .bind(input.habit_goal_id)
            .bind(input.pact_type.as_str())
            .bind(input.status.as_str())
            .bind(input.duration_days)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.consequence_type.as_str())
            .bind(&input.consequence_details)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Pact>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pacts WHERE id = $1");
        sqlx::query_as::<_, Pact>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_with_goal(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PactWithGoal>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM pacts p \
             LEFT JOIN habit_goals g ON g.id = p.habit_goal_id \
             WHERE p.id = $1"
        );
        sqlx::query_as::<_, PactWithGoal>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Pacts the user created or was invited to, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: UserId,
        status: Option<PactStatus>,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<PactWithGoal>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM pacts p \
             LEFT JOIN habit_goals g ON g.id = p.habit_goal_id \
             WHERE (p.creator_user_id = $1 OR p.partner_user_id = $1) \
               AND ($2::TEXT IS NULL OR p.status = $2) \
             ORDER BY p.created_at DESC, p.id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, PactWithGoal>(&query)
            .bind(user_id)
            .bind(status.map(|s| s.as_str()))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn list_pending_invites(
        pool: &PgPool,
        user_id: UserId,
    ) -> Result<Vec<PactWithGoal>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM pacts p \
             LEFT JOIN habit_goals g ON g.id = p.habit_goal_id \
             WHERE p.partner_user_id = $1 AND p.status = 'pending' \
             ORDER BY p.created_at DESC, p.id DESC"
        );
        sqlx::query_as::<_, PactWithGoal>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Activate a pact starting at `start`; the end date follows from the
    /// stored duration.
    pub async fn activate(
        pool: &PgPool,
        id: DbId,
        start: Timestamp,
    ) -> Result<Option<Pact>, sqlx::Error> {
        let query = format!(
            "UPDATE pacts SET \
                status = 'active', \
                start_date = $2, \
                end_date = $2 + make_interval(days => duration_days), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Pact>(&query)
            .bind(id)
            .bind(start)
            .fetch_optional(pool)
            .await
    }

    /// Record a terminal status with its reason and, if scored, the winner
    /// and completion rates.
    pub async fn finish(
        pool: &PgPool,
        id: DbId,
        outcome: &PactOutcome,
    ) -> Result<Option<Pact>, sqlx::Error> {
        let query = format!(
            "UPDATE pacts SET \
                status = $2, \
                end_reason = $3, \
                winner_id = $4, \
                creator_completion_rate = COALESCE($5, creator_completion_rate), \
                partner_completion_rate = COALESCE($6, partner_completion_rate), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Pact>(&query)
            .bind(id)
            .bind(outcome.status.as_str())
            .bind(outcome.end_reason.as_str())
            .bind(outcome.winner_id)
            .bind(outcome.creator_completion_rate)
            .bind(outcome.partner_completion_rate)
            .fetch_optional(pool)
            .await
    }

    /// Delete a pending pact created by `user_id`.
    pub async fn delete_pending(
        pool: &PgPool,
        id: DbId,
        user_id: UserId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM pacts WHERE id = $1 AND creator_user_id = $2 AND status = 'pending'",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_active_ending_before(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<Pact>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pacts \
             WHERE status = 'active' AND end_date < $1 \
             ORDER BY end_date ASC"
        );
        sqlx::query_as::<_, Pact>(&query)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    pub async fn list_pending_created_before(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<Pact>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pacts \
             WHERE status = 'pending' AND created_at < $1 \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, Pact>(&query)
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }
}
