//! Repository for the `habit_goals` table.

use habits_core::types::{DbId, UserId};
use sqlx::PgPool;

use crate::models::habit_goal::{HabitGoal, NewHabitGoal, UpdateHabitGoal};

/// Column list for `habit_goals` queries.
const COLUMNS: &str = "id, name, description, category, emoji, frequency_type, \
    frequency_count, target_days_of_week, created_by_user_id, is_template, is_public, \
    usage_count, created_at, updated_at";

/// Provides CRUD operations for habit goals.
pub struct HabitGoalRepo;

impl HabitGoalRepo {
    /// Insert a new habit goal, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewHabitGoal) -> Result<HabitGoal, sqlx::Error> {
        let query = format!(
            "INSERT INTO habit_goals \
                (name, description, category, emoji, frequency_type, frequency_count, \
                 target_days_of_week, created_by_user_id, is_template, is_public) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HabitGoal>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.emoji)
            .bind(input.frequency_type.as_str())
            .bind(input.frequency_count)
            .bind(&input.target_days_of_week)
            .bind(input.created_by_user_id)
            .bind(input.is_template)
            .bind(input.is_public)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<HabitGoal>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM habit_goals WHERE id = $1");
        sqlx::query_as::<_, HabitGoal>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Goals created by a user, newest first.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<HabitGoal>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM habit_goals \
             WHERE created_by_user_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, HabitGoal>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Templates (`template = true`) or public goals, optionally filtered by
    /// category, most used first.
    pub async fn list_shared(
        pool: &PgPool,
        template: bool,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<HabitGoal>, sqlx::Error> {
        let flag = if template { "is_template" } else { "is_public" };
        let query = format!(
            "SELECT {COLUMNS} FROM habit_goals \
             WHERE {flag} = true AND ($1::TEXT IS NULL OR category = $1) \
             ORDER BY usage_count DESC, id ASC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, HabitGoal>(&query)
            .bind(category)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Name substring search over templates and public goals.
    pub async fn search_by_name(
        pool: &PgPool,
        term: &str,
        limit: i64,
    ) -> Result<Vec<HabitGoal>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM habit_goals \
             WHERE name ILIKE '%' || $1 || '%' \
               AND (is_template = true OR is_public = true) \
             ORDER BY usage_count DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, HabitGoal>(&query)
            .bind(term)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Update a goal. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateHabitGoal,
    ) -> Result<Option<HabitGoal>, sqlx::Error> {
        let query = format!(
            "UPDATE habit_goals SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                category = COALESCE($4, category), \
                emoji = COALESCE($5, emoji), \
                frequency_type = COALESCE($6, frequency_type), \
                frequency_count = COALESCE($7, frequency_count), \
                target_days_of_week = COALESCE($8, target_days_of_week), \
                is_public = COALESCE($9, is_public), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HabitGoal>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.emoji)
            .bind(input.frequency_type.map(|f| f.as_str()))
            .bind(input.frequency_count)
            .bind(&input.target_days_of_week)
            .bind(input.is_public)
            .fetch_optional(pool)
            .await
    }

    pub async fn increment_usage(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE habit_goals SET usage_count = usage_count + 1, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Delete a goal owned by `user_id`. Templates are never deleted.
    pub async fn delete(pool: &PgPool, id: DbId, user_id: UserId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM habit_goals \
             WHERE id = $1 AND created_by_user_id = $2 AND is_template = false",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
