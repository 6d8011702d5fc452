//! Repository for the `streaks` and `streak_history` tables.

use habits_core::streaks::{StreakEventType, StreakState};
use habits_core::types::{Date, DbId, UserId};
use sqlx::PgPool;

use crate::models::streak::{NewStreak, NewStreakHistory, Streak, StreakHistory};

/// Column list for `streaks` queries.
const COLUMNS: &str = "id, user_id, habit_goal_id, pact_id, current_streak, \
    current_streak_start_date, longest_streak, longest_streak_start_date, \
    longest_streak_end_date, last_completed_date, grace_period_days, grace_days_used, \
    last_grace_date, is_active, created_at, updated_at";

/// Column list for `streak_history` queries.
const HISTORY_COLUMNS: &str = "id, streak_id, user_id, checkin_id, event_type, event_date, \
    streak_before, streak_after, milestone_reached, created_at";

/// Provides streak bookkeeping and the append-only history.
pub struct StreakRepo;

impl StreakRepo {
    pub async fn create(pool: &PgPool, input: &NewStreak) -> Result<Streak, sqlx::Error> {
        let query = format!(
            "INSERT INTO streaks (user_id, habit_goal_id, pact_id, grace_period_days) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Streak>(&query)
            .bind(input.user_id)
            .bind(input.habit_goal_id)
            .bind(input.pact_id)
            .bind(input.grace_period_days)
            .fetch_one(pool)
            .await
    }

    /// Insert the streak unless one already exists for (user, goal, pact),
    /// then return whichever row is there.
    pub async fn get_or_create(pool: &PgPool, input: &NewStreak) -> Result<Streak, sqlx::Error> {
        sqlx::query(
            "INSERT INTO streaks (user_id, habit_goal_id, pact_id, grace_period_days) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, habit_goal_id, (COALESCE(pact_id, 0))) DO NOTHING",
        )
        .bind(input.user_id)
        .bind(input.habit_goal_id)
        .bind(input.pact_id)
        .bind(input.grace_period_days)
        .execute(pool)
        .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM streaks \
             WHERE user_id = $1 AND habit_goal_id = $2 AND pact_id IS NOT DISTINCT FROM $3"
        );
        sqlx::query_as::<_, Streak>(&query)
            .bind(input.user_id)
            .bind(input.habit_goal_id)
            .bind(input.pact_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Streak>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM streaks WHERE id = $1");
        sqlx::query_as::<_, Streak>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_user_and_habit(
        pool: &PgPool,
        user_id: UserId,
        habit_goal_id: DbId,
    ) -> Result<Option<Streak>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM streaks \
             WHERE user_id = $1 AND habit_goal_id = $2 \
             ORDER BY pact_id NULLS FIRST, id ASC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Streak>(&query)
            .bind(user_id)
            .bind(habit_goal_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_user(
        pool: &PgPool,
        user_id: UserId,
        is_active: Option<bool>,
    ) -> Result<Vec<Streak>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM streaks \
             WHERE user_id = $1 AND ($2::BOOLEAN IS NULL OR is_active = $2) \
             ORDER BY current_streak DESC, id ASC"
        );
        sqlx::query_as::<_, Streak>(&query)
            .bind(user_id)
            .bind(is_active)
            .fetch_all(pool)
            .await
    }

    pub async fn list_by_pact(pool: &PgPool, pact_id: DbId) -> Result<Vec<Streak>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM streaks WHERE pact_id = $1 \
             ORDER BY current_streak DESC, id ASC"
        );
        sqlx::query_as::<_, Streak>(&query)
            .bind(pact_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_top(pool: &PgPool, limit: i64) -> Result<Vec<Streak>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM streaks \
             WHERE is_active = true AND current_streak > 0 \
             ORDER BY current_streak DESC, id ASC \
             LIMIT $1"
        );
        sqlx::query_as::<_, Streak>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Persist the counters computed by the streak rules.
    pub async fn save_progress(
        pool: &PgPool,
        id: DbId,
        state: &StreakState,
    ) -> Result<Option<Streak>, sqlx::Error> {
        let query = format!(
            "UPDATE streaks SET \
                current_streak = $2, \
                current_streak_start_date = $3, \
                longest_streak = $4, \
                longest_streak_start_date = $5, \
                longest_streak_end_date = $6, \
                last_completed_date = $7, \
                grace_days_used = $8, \
                last_grace_date = $9, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Streak>(&query)
            .bind(id)
            .bind(state.current_streak)
            .bind(state.current_streak_start_date)
            .bind(state.longest_streak)
            .bind(state.longest_streak_start_date)
            .bind(state.longest_streak_end_date)
            .bind(state.last_completed_date)
            .bind(state.grace_days_used)
            .bind(state.grace_covered_date)
            .fetch_optional(pool)
            .await
    }

    /// Consume one grace day. The guard keeps `grace_days_used` within the
    /// allowance even under concurrent requests.
    pub async fn use_grace_day(
        pool: &PgPool,
        id: DbId,
        covered_date: Date,
    ) -> Result<Option<Streak>, sqlx::Error> {
        let query = format!(
            "UPDATE streaks SET \
                grace_days_used = grace_days_used + 1, \
                last_grace_date = $2, \
                updated_at = NOW() \
             WHERE id = $1 AND grace_days_used < grace_period_days \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Streak>(&query)
            .bind(id)
            .bind(covered_date)
            .fetch_optional(pool)
            .await
    }

    pub async fn deactivate_by_pact(pool: &PgPool, pact_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE streaks SET is_active = false, updated_at = NOW() \
             WHERE pact_id = $1 AND is_active = true",
        )
        .bind(pact_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn append_history(
        pool: &PgPool,
        input: &NewStreakHistory,
    ) -> Result<StreakHistory, sqlx::Error> {
        let query = format!(
            "INSERT INTO streak_history \
                (streak_id, user_id, checkin_id, event_type, event_date, \
                 streak_before, streak_after, milestone_reached) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {HISTORY_COLUMNS}"
        );
        sqlx::query_as::<_, StreakHistory>(&query)
            .bind(input.streak_id)
            .bind(input.user_id)
            .bind(input.checkin_id)
            .bind(input.event_type.as_str())
            .bind(input.event_date)
            .bind(input.streak_before)
            .bind(input.streak_after)
            .bind(input.milestone_reached)
            .fetch_one(pool)
            .await
    }

    pub async fn list_history(
        pool: &PgPool,
        streak_id: DbId,
        limit: Option<i64>,
    ) -> Result<Vec<StreakHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {HISTORY_COLUMNS} FROM streak_history \
             WHERE streak_id = $1 \
             ORDER BY event_date DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, StreakHistory>(&query)
            .bind(streak_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn list_milestones(
        pool: &PgPool,
        user_id: UserId,
    ) -> Result<Vec<StreakHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {HISTORY_COLUMNS} FROM streak_history \
             WHERE user_id = $1 AND event_type = $2 AND milestone_reached IS NOT NULL \
             ORDER BY milestone_reached DESC, id DESC"
        );
        sqlx::query_as::<_, StreakHistory>(&query)
            .bind(user_id)
            .bind(StreakEventType::MilestoneReached.as_str())
            .fetch_all(pool)
            .await
    }
}
