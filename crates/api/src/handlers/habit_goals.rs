//! Handlers for `/habit-goals`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use habits_core::error::CoreError;
use habits_core::habits::{
    validate_frequency_count, validate_target_days, FrequencyType, DEFAULT_FREQUENCY_COUNT,
    DEFAULT_SEARCH_LIMIT,
};
use habits_core::types::DbId;
use habits_db::models::habit_goal::{NewHabitGoal, UpdateHabitGoal};
use serde::Deserialize;

use crate::error::{AppResult, StoreResultExt};
use crate::middleware::request_user::RequestUser;
use crate::query::{clamp_limit, clamp_offset, CategoryParams, PaginationParams, SearchParams, MAX_LIMIT};
use crate::response::{DataResponse, DeletedResponse};
use crate::state::AppState;

const ERROR_TAG: &str = "SQL:HABIT_GOALS_ROUTES:ERROR";

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST` and `PUT`. Every field is optional on the wire; `name` is
/// enforced for creation by the handler.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitGoalRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub emoji: Option<String>,
    pub frequency_type: Option<String>,
    pub frequency_count: Option<i32>,
    pub target_days_of_week: Option<Vec<i16>>,
    pub is_public: Option<bool>,
}

impl HabitGoalRequest {
    /// Parse and range-check the schedule fields that were supplied.
    fn schedule_fields(&self) -> Result<(Option<FrequencyType>, Option<i32>), CoreError> {
        let frequency_type = self
            .frequency_type
            .as_deref()
            .map(str::parse::<FrequencyType>)
            .transpose()?;
        if let Some(count) = self.frequency_count {
            validate_frequency_count(count)?;
        }
        if let Some(days) = &self.target_days_of_week {
            validate_target_days(days)?;
        }
        Ok((frequency_type, self.frequency_count))
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/habit-goals
pub async fn create(
    user: RequestUser,
    State(state): State<AppState>,
    Json(input): Json<HabitGoalRequest>,
) -> AppResult<impl IntoResponse> {
    let name = input
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| CoreError::Validation("name is required".into()))?
        .to_string();
    let (frequency_type, frequency_count) = input.schedule_fields()?;

    let goal = state
        .store
        .create_habit_goal(&NewHabitGoal {
            name,
            description: input.description,
            category: input.category,
            emoji: input.emoji,
            frequency_type: frequency_type.unwrap_or_default(),
            frequency_count: frequency_count.unwrap_or(DEFAULT_FREQUENCY_COUNT),
            target_days_of_week: input.target_days_of_week.unwrap_or_default(),
            created_by_user_id: Some(user.user_id),
            is_template: false,
            is_public: input.is_public.unwrap_or(false),
        })
        .await
        .tagged(ERROR_TAG)?;

    tracing::info!(user_id = %user.user_id, habit_goal_id = goal.id, "Habit goal created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: goal })))
}

/// GET /api/v1/habit-goals
pub async fn list_mine(
    user: RequestUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let goals = state
        .store
        .list_user_habit_goals(user.user_id, params.limit_or(MAX_LIMIT), params.offset())
        .await
        .tagged(ERROR_TAG)?;
    Ok(Json(DataResponse { data: goals }))
}

/// GET /api/v1/habit-goals/templates?category=
pub async fn list_templates(
    _user: RequestUser,
    State(state): State<AppState>,
    Query(params): Query<CategoryParams>,
) -> AppResult<impl IntoResponse> {
    let goals = state
        .store
        .list_template_goals(
            params.category.as_deref(),
            clamp_limit(params.limit, MAX_LIMIT),
            clamp_offset(params.offset),
        )
        .await
        .tagged(ERROR_TAG)?;
    Ok(Json(DataResponse { data: goals }))
}

/// GET /api/v1/habit-goals/public?category=
pub async fn list_public(
    _user: RequestUser,
    State(state): State<AppState>,
    Query(params): Query<CategoryParams>,
) -> AppResult<impl IntoResponse> {
    let goals = state
        .store
        .list_public_goals(
            params.category.as_deref(),
            clamp_limit(params.limit, MAX_LIMIT),
            clamp_offset(params.offset),
        )
        .await
        .tagged(ERROR_TAG)?;
    Ok(Json(DataResponse { data: goals }))
}

/// GET /api/v1/habit-goals/search?query=
pub async fn search(
    _user: RequestUser,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let term = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| CoreError::Validation("Search query is required".into()))?;

    let goals = state
        .store
        .search_habit_goals(term, clamp_limit(params.limit, DEFAULT_SEARCH_LIMIT))
        .await
        .tagged(ERROR_TAG)?;
    Ok(Json(DataResponse { data: goals }))
}

/// GET /api/v1/habit-goals/{id}
pub async fn get_by_id(
    _user: RequestUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let goal = state
        .store
        .find_habit_goal(id)
        .await
        .tagged(ERROR_TAG)?
        .ok_or_else(|| CoreError::not_found("Habit goal", id))?;
    Ok(Json(DataResponse { data: goal }))
}

/// PUT /api/v1/habit-goals/{id}
///
/// Owner only; templates are immutable.
pub async fn update(
    user: RequestUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<HabitGoalRequest>,
) -> AppResult<impl IntoResponse> {
    let (frequency_type, frequency_count) = input.schedule_fields()?;

    let existing = state
        .store
        .find_habit_goal(id)
        .await
        .tagged(ERROR_TAG)?
        .ok_or_else(|| CoreError::not_found("Habit goal", id))?;
    if !existing.is_owned_by(user.user_id) {
        return Err(CoreError::Forbidden("You do not own this habit goal".into()).into());
    }
    if existing.is_template {
        return Err(CoreError::Forbidden("Habit goal templates cannot be modified".into()).into());
    }

    let changes = UpdateHabitGoal {
        name: input.name,
        description: input.description,
        category: input.category,
        emoji: input.emoji,
        frequency_type,
        frequency_count,
        target_days_of_week: input.target_days_of_week,
        is_public: input.is_public,
    };
    let goal = state
        .store
        .update_habit_goal(id, &changes)
        .await
        .tagged(ERROR_TAG)?
        .ok_or_else(|| CoreError::not_found("Habit goal", id))?;

    tracing::info!(user_id = %user.user_id, habit_goal_id = id, "Habit goal updated");
    Ok(Json(DataResponse { data: goal }))
}

/// DELETE /api/v1/habit-goals/{id}
pub async fn delete(
    user: RequestUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = state
        .store
        .delete_habit_goal(id, user.user_id)
        .await
        .tagged(ERROR_TAG)?;
    if !deleted {
        return Err(CoreError::Forbidden("You cannot delete this habit goal".into()).into());
    }

    tracing::info!(user_id = %user.user_id, habit_goal_id = id, "Habit goal deleted");
    Ok(Json(DataResponse {
        data: DeletedResponse { deleted: true },
    }))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn schedule_fields_are_checked() {
        let ok = HabitGoalRequest {
            frequency_type: Some("weekly".into()),
            frequency_count: Some(3),
            target_days_of_week: Some(vec![1, 3, 5]),
            ..Default::default()
        };
        assert_eq!(
            ok.schedule_fields().unwrap(),
            (Some(FrequencyType::Weekly), Some(3))
        );

        let bad_day = HabitGoalRequest {
            target_days_of_week: Some(vec![7]),
            ..Default::default()
        };
        assert_matches!(bad_day.schedule_fields(), Err(CoreError::Validation(_)));

        let bad_type = HabitGoalRequest {
            frequency_type: Some("hourly".into()),
            ..Default::default()
        };
        assert_matches!(bad_type.schedule_fields(), Err(CoreError::Validation(_)));
    }
}
