//! Repository for the `habit_checkins` table.

use habits_core::pacts::CheckinTally;
use habits_core::types::{Date, DbId, UserId};
use sqlx::PgPool;

use crate::models::habit_checkin::{CheckinChanges, HabitCheckin, UpsertCheckin};

/// Column list for `habit_checkins` queries.
const COLUMNS: &str = "id, user_id, pact_id, habit_goal_id, scheduled_date, status, \
    completed_at, notes, self_rating, difficulty_rating, has_proof, proof_verified, \
    contributed_to_streak, created_at, updated_at";

/// Provides create-or-update and scoped reads for checkins.
pub struct HabitCheckinRepo;

impl HabitCheckinRepo {
    /// Insert a checkin, or update the existing one for the same
    /// (user, habit goal, scheduled date). A supplied pact id is attached to
    /// the existing row; an omitted one keeps whatever the row had.
    pub async fn upsert(pool: &PgPool, input: &UpsertCheckin) -> Result<HabitCheckin, sqlx::Error> {
        let query = format!(
            "INSERT INTO habit_checkins \
                (user_id, habit_goal_id, pact_id, scheduled_date, status, completed_at, \
                 notes, self_rating, difficulty_rating, has_proof) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT ON CONSTRAINT uq_habit_checkins_user_goal_date DO UPDATE SET \
                pact_id = COALESCE(EXCLUDED.pact_id, habit_checkins.pact_id), \
                status = EXCLUDED.status, \
                completed_at = CASE WHEN EXCLUDED.status = 'completed' \
                    THEN COALESCE(habit_checkins.completed_at, EXCLUDED.completed_at) \
                    ELSE NULL END, \
                notes = EXCLUDED.notes, \
                self_rating = EXCLUDED.self_rating, \
                difficulty_rating = EXCLUDED.difficulty_rating, \
                has_proof = EXCLUDED.has_proof, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HabitCheckin>(&query)
            .bind(input.user_id)
            .bind(input.habit_goal_id)
            .bind(input.pact_id)
            .bind(input.scheduled_date)
            .bind(input.status.as_str())
            .bind(input.completed_at)
            .bind(&input.notes)
            .bind(input.self_rating)
            .bind(input.difficulty_rating)
            .bind(input.has_proof)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<HabitCheckin>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM habit_checkins WHERE id = $1");
        sqlx::query_as::<_, HabitCheckin>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_date(
        pool: &PgPool,
        user_id: UserId,
        date: Date,
        habit_goal_id: Option<DbId>,
    ) -> Result<Vec<HabitCheckin>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM habit_checkins \
             WHERE user_id = $1 AND scheduled_date = $2 \
               AND ($3::BIGINT IS NULL OR habit_goal_id = $3) \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, HabitCheckin>(&query)
            .bind(user_id)
            .bind(date)
            .bind(habit_goal_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_in_range(
        pool: &PgPool,
        user_id: UserId,
        start: Date,
        end: Date,
        habit_goal_id: Option<DbId>,
    ) -> Result<Vec<HabitCheckin>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM habit_checkins \
             WHERE user_id = $1 AND scheduled_date BETWEEN $2 AND $3 \
               AND ($4::BIGINT IS NULL OR habit_goal_id = $4) \
             ORDER BY scheduled_date DESC, id DESC"
        );
        sqlx::query_as::<_, HabitCheckin>(&query)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .bind(habit_goal_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_by_pact(
        pool: &PgPool,
        pact_id: DbId,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<HabitCheckin>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM habit_checkins \
             WHERE pact_id = $1 \
             ORDER BY scheduled_date DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, HabitCheckin>(&query)
            .bind(pact_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Apply a partial update. Only non-`None` fields are written.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        changes: &CheckinChanges,
    ) -> Result<Option<HabitCheckin>, sqlx::Error> {
        let query = format!(
            "UPDATE habit_checkins SET \
                status = COALESCE($2, status), \
                completed_at = COALESCE($3, completed_at), \
                notes = COALESCE($4, notes), \
                self_rating = COALESCE($5, self_rating), \
                difficulty_rating = COALESCE($6, difficulty_rating), \
                has_proof = COALESCE($7, has_proof), \
                contributed_to_streak = COALESCE($8, contributed_to_streak), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HabitCheckin>(&query)
            .bind(id)
            .bind(changes.status.map(|s| s.as_str()))
            .bind(changes.completed_at)
            .bind(&changes.notes)
            .bind(changes.self_rating)
            .bind(changes.difficulty_rating)
            .bind(changes.has_proof)
            .bind(changes.contributed_to_streak)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId, user_id: UserId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM habit_checkins WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Completed vs. total checkins a user logged against a pact.
    pub async fn tally_for_pact(
        pool: &PgPool,
        pact_id: DbId,
        user_id: UserId,
    ) -> Result<CheckinTally, sqlx::Error> {
        let (completed, total): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*) FILTER (WHERE status = 'completed'), COUNT(*) \
             FROM habit_checkins WHERE pact_id = $1 AND user_id = $2",
        )
        .bind(pact_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(CheckinTally {
            completed: i32::try_from(completed).unwrap_or(i32::MAX),
            total: i32::try_from(total).unwrap_or(i32::MAX),
        })
    }
}
