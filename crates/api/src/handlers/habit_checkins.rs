//! Handlers for `/habit-checkins`.
//!
//! Creating a checkin is an upsert keyed by (user, habit goal, scheduled
//! date). When the resulting status is `completed` the streak engine runs
//! afterwards; its failures are logged and never change the response.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use habits_core::access::{ensure_owner, ensure_pact_participant, Action};
use habits_core::error::CoreError;
use habits_core::habits::CheckinStatus;
use habits_core::streaks::today;
use habits_core::types::{Date, DbId};
use habits_db::models::habit_checkin::{CheckinChanges, HabitCheckin, UpsertCheckin};
use serde::Deserialize;
use validator::Validate;

use crate::engine::completion::{record_completion, CompletionContext};
use crate::error::{AppResult, StoreResultExt};
use crate::middleware::request_user::RequestUser;
use crate::query::{clamp_offset, DateRangeParams, HabitFilterParams, PaginationParams, MAX_LIMIT};
use crate::response::{DataResponse, DeletedResponse};
use crate::state::AppState;

const ERROR_TAG: &str = "SQL:HABIT_CHECKINS_ROUTES:ERROR";

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckinRequest {
    pub habit_goal_id: Option<DbId>,
    pub pact_id: Option<DbId>,
    /// `YYYY-MM-DD`; defaults to today.
    pub scheduled_date: Option<String>,
    /// Defaults to `completed`.
    pub status: Option<String>,
    pub notes: Option<String>,
    #[validate(range(min = 1, max = 5, message = "selfRating must be between 1 and 5"))]
    pub self_rating: Option<i16>,
    #[validate(range(min = 1, max = 5, message = "difficultyRating must be between 1 and 5"))]
    pub difficulty_rating: Option<i16>,
    pub has_proof: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheckinRequest {
    pub status: Option<String>,
    pub notes: Option<String>,
    #[validate(range(min = 1, max = 5, message = "selfRating must be between 1 and 5"))]
    pub self_rating: Option<i16>,
    #[validate(range(min = 1, max = 5, message = "difficultyRating must be between 1 and 5"))]
    pub difficulty_rating: Option<i16>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkipCheckinRequest {
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/habit-checkins
pub async fn create(
    user: RequestUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCheckinRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let habit_goal_id = input
        .habit_goal_id
        .ok_or_else(|| CoreError::Validation("habitGoalId is required".into()))?;
    let scheduled_date = match input.scheduled_date.as_deref() {
        Some(raw) => parse_date(raw, "scheduledDate")?,
        None => today(),
    };
    let status = match input.status.as_deref() {
        Some(raw) => raw.parse::<CheckinStatus>()?,
        None => CheckinStatus::Completed,
    };

    let goal = state
        .store
        .find_habit_goal(habit_goal_id)
        .await
        .tagged(ERROR_TAG)?
        .ok_or_else(|| CoreError::not_found("Habit goal", habit_goal_id))?;

    let pact = match input.pact_id {
        Some(pact_id) => {
            let pact = state
                .store
                .find_pact(pact_id)
                .await
                .tagged(ERROR_TAG)?
                .ok_or_else(|| CoreError::not_found("Pact", pact_id))?;
            ensure_pact_participant(user.user_id, pact.creator_user_id, pact.partner_user_id)?;
            Some(pact)
        }
        None => None,
    };

    let completed = status == CheckinStatus::Completed;
    let checkin = state
        .store
        .upsert_checkin(&UpsertCheckin {
            user_id: user.user_id,
            habit_goal_id,
            pact_id: input.pact_id,
            scheduled_date,
            status,
            completed_at: completed.then(Utc::now),
            notes: input.notes,
            self_rating: input.self_rating,
            difficulty_rating: input.difficulty_rating,
            has_proof: input.has_proof.unwrap_or(false),
        })
        .await
        .tagged(ERROR_TAG)?;

    tracing::info!(
        user_id = %user.user_id,
        checkin_id = checkin.id,
        habit_goal_id,
        status = %checkin.status,
        "Checkin recorded"
    );

    let checkin = if completed {
        let ctx = CompletionContext {
            store: state.store.as_ref(),
            notifier: &state.notifier,
            user: &user,
            goal: &goal,
            pact: pact.as_ref(),
            grace_period_days: state.config.streak_grace_period_days,
        };
        let fallback = checkin.clone();
        match record_completion(&ctx, checkin).await {
            Ok(outcome) => outcome.checkin,
            Err(e) => {
                tracing::error!(
                    tag = ERROR_TAG,
                    checkin_id = fallback.id,
                    error = %e,
                    "Streak bookkeeping failed"
                );
                fallback
            }
        }
    } else {
        checkin
    };

    Ok((StatusCode::CREATED, Json(DataResponse { data: checkin })))
}

/// GET /api/v1/habit-checkins/today
pub async fn list_today(
    user: RequestUser,
    State(state): State<AppState>,
    Query(params): Query<HabitFilterParams>,
) -> AppResult<impl IntoResponse> {
    let checkins = state
        .store
        .list_checkins_for_date(user.user_id, today(), params.habit_goal_id)
        .await
        .tagged(ERROR_TAG)?;
    Ok(Json(DataResponse { data: checkins }))
}

/// GET /api/v1/habit-checkins/range?startDate=&endDate=
pub async fn list_range(
    user: RequestUser,
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> AppResult<impl IntoResponse> {
    let (Some(start), Some(end)) = (params.start_date.as_deref(), params.end_date.as_deref())
    else {
        return Err(CoreError::Validation("startDate and endDate are required".into()).into());
    };
    let start = parse_date(start, "startDate")?;
    let end = parse_date(end, "endDate")?;

    let checkins = state
        .store
        .list_checkins_in_range(user.user_id, start, end, params.habit_goal_id)
        .await
        .tagged(ERROR_TAG)?;
    Ok(Json(DataResponse { data: checkins }))
}

/// GET /api/v1/habit-checkins/pact/{pact_id}
pub async fn list_for_pact(
    user: RequestUser,
    State(state): State<AppState>,
    Path(pact_id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let pact = state
        .store
        .find_pact(pact_id)
        .await
        .tagged(ERROR_TAG)?
        .ok_or_else(|| CoreError::not_found("Pact", pact_id))?;
    ensure_pact_participant(user.user_id, pact.creator_user_id, pact.partner_user_id)?;

    let checkins = state
        .store
        .list_pact_checkins(
            pact_id,
            params.limit.map(|l| l.clamp(1, MAX_LIMIT)),
            clamp_offset(params.offset),
        )
        .await
        .tagged(ERROR_TAG)?;
    Ok(Json(DataResponse { data: checkins }))
}

/// GET /api/v1/habit-checkins/{id}
pub async fn get_by_id(
    user: RequestUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let checkin = load_owned(&state, &user, id, Action::View).await?;
    Ok(Json(DataResponse { data: checkin }))
}

/// PUT /api/v1/habit-checkins/{id}
///
/// `completedAt` is stamped only on the first transition into `completed`.
pub async fn update(
    user: RequestUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCheckinRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let status = input
        .status
        .as_deref()
        .map(str::parse::<CheckinStatus>)
        .transpose()?;

    let existing = load_owned(&state, &user, id, Action::Update).await?;

    let completed_at = match status {
        Some(CheckinStatus::Completed) if existing.completed_at.is_none() => Some(Utc::now()),
        _ => None,
    };
    let changes = CheckinChanges {
        status,
        completed_at,
        notes: input.notes,
        self_rating: input.self_rating,
        difficulty_rating: input.difficulty_rating,
        ..Default::default()
    };

    let checkin = state
        .store
        .update_checkin(id, &changes)
        .await
        .tagged(ERROR_TAG)?
        .ok_or_else(|| CoreError::not_found("Checkin", id))?;

    tracing::info!(user_id = %user.user_id, checkin_id = id, "Checkin updated");
    Ok(Json(DataResponse { data: checkin }))
}

/// PUT /api/v1/habit-checkins/{id}/skip
///
/// Marks the checkin skipped. Streaks are not touched.
pub async fn skip(
    user: RequestUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<SkipCheckinRequest>>,
) -> AppResult<impl IntoResponse> {
    let notes = body.and_then(|Json(b)| b.notes);
    load_owned(&state, &user, id, Action::Update).await?;

    let checkin = state
        .store
        .update_checkin(
            id,
            &CheckinChanges {
                status: Some(CheckinStatus::Skipped),
                notes,
                contributed_to_streak: Some(false),
                ..Default::default()
            },
        )
        .await
        .tagged(ERROR_TAG)?
        .ok_or_else(|| CoreError::not_found("Checkin", id))?;

    tracing::info!(user_id = %user.user_id, checkin_id = id, "Checkin skipped");
    Ok(Json(DataResponse { data: checkin }))
}

/// DELETE /api/v1/habit-checkins/{id}
///
/// A checkin owned by someone else is reported as not found.
pub async fn delete(
    user: RequestUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = state
        .store
        .delete_checkin(id, user.user_id)
        .await
        .tagged(ERROR_TAG)?;
    if !deleted {
        return Err(CoreError::not_found("Checkin", id).into());
    }

    tracing::info!(user_id = %user.user_id, checkin_id = id, "Checkin deleted");
    Ok(Json(DataResponse {
        data: DeletedResponse { deleted: true },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_owned(
    state: &AppState,
    user: &RequestUser,
    id: DbId,
    action: Action,
) -> AppResult<HabitCheckin> {
    let checkin = state
        .store
        .find_checkin(id)
        .await
        .tagged(ERROR_TAG)?
        .ok_or_else(|| CoreError::not_found("Checkin", id))?;
    ensure_owner(user.user_id, checkin.user_id, action, "checkin")?;
    Ok(checkin)
}

/// Parse a `YYYY-MM-DD` query or body value.
pub(crate) fn parse_date(raw: &str, field: &str) -> Result<Date, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        CoreError::Validation(format!("Invalid {field} '{raw}'. Expected YYYY-MM-DD"))
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_calendar_dates() {
        assert_eq!(
            parse_date("2026-02-28", "startDate").unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
        assert_matches!(
            parse_date("28/02/2026", "startDate"),
            Err(CoreError::Validation(msg)) if msg.contains("startDate")
        );
    }

    #[test]
    fn ratings_are_bounded() {
        let body = UpdateCheckinRequest {
            self_rating: Some(6),
            ..Default::default()
        };
        assert!(body.validate().is_err());

        let body = UpdateCheckinRequest {
            difficulty_rating: Some(3),
            ..Default::default()
        };
        assert!(body.validate().is_ok());
    }
}
