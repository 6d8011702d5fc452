//! Handlers for `/streaks`. Reads are projections enriched with risk level,
//! milestone progress and display fields; the only write is spending a
//! grace day.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use habits_core::access::{ensure_owner, ensure_pact_participant, Action};
use habits_core::error::CoreError;
use habits_core::habits::FrequencyType;
use habits_core::streaks::{can_use_grace_period, today, yesterday, StreakEventType};
use habits_core::types::DbId;
use habits_db::models::streak::{NewStreakHistory, Streak};

use crate::engine::streak_view::{enrich_all, EmptyStreak, EnrichedStreak, RankedStreak};
use crate::error::{AppResult, StoreResultExt};
use crate::middleware::request_user::RequestUser;
use crate::query::{clamp_limit, LimitParams, StreakListParams, MAX_LIMIT};
use crate::response::DataResponse;
use crate::state::AppState;

const ERROR_TAG: &str = "SQL:STREAKS_ROUTES:ERROR";

/// Default size of the leaderboard.
const DEFAULT_TOP_LIMIT: i64 = 10;

const NO_GRACE_DAYS: &str = "No grace days available for this streak";

/// GET /api/v1/streaks?isActive=
pub async fn list(
    user: RequestUser,
    State(state): State<AppState>,
    Query(params): Query<StreakListParams>,
) -> AppResult<impl IntoResponse> {
    let streaks = state
        .store
        .list_user_streaks(user.user_id, params.active_filter())
        .await
        .tagged(ERROR_TAG)?;
    Ok(Json(DataResponse {
        data: enrich_all(streaks),
    }))
}

/// GET /api/v1/streaks/active
pub async fn list_active(
    user: RequestUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let streaks = state
        .store
        .list_user_streaks(user.user_id, Some(true))
        .await
        .tagged(ERROR_TAG)?;
    Ok(Json(DataResponse {
        data: enrich_all(streaks),
    }))
}

/// GET /api/v1/streaks/milestones
pub async fn list_milestones(
    user: RequestUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let history = state
        .store
        .list_milestone_history(user.user_id)
        .await
        .tagged(ERROR_TAG)?;
    Ok(Json(DataResponse { data: history }))
}

/// GET /api/v1/streaks/top?limit=
pub async fn list_top(
    _user: RequestUser,
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> AppResult<impl IntoResponse> {
    let streaks = state
        .store
        .list_top_streaks(clamp_limit(params.limit, DEFAULT_TOP_LIMIT))
        .await
        .tagged(ERROR_TAG)?;
    let ranked: Vec<RankedStreak> = streaks.into_iter().map(RankedStreak::from).collect();
    Ok(Json(DataResponse { data: ranked }))
}

/// GET /api/v1/streaks/habit/{habit_goal_id}
///
/// Returns a zeroed record when the user has no streak for the habit yet.
pub async fn get_by_habit(
    user: RequestUser,
    State(state): State<AppState>,
    Path(habit_goal_id): Path<DbId>,
) -> AppResult<axum::response::Response> {
    let streak = state
        .store
        .find_streak_by_habit(user.user_id, habit_goal_id)
        .await
        .tagged(ERROR_TAG)?;

    let Some(streak) = streak else {
        let empty = EmptyStreak::new(user.user_id, habit_goal_id);
        return Ok(Json(DataResponse { data: empty }).into_response());
    };

    let frequency = goal_frequency(&state, streak.habit_goal_id).await?;
    Ok(Json(DataResponse {
        data: EnrichedStreak::new(streak, frequency),
    })
    .into_response())
}

/// GET /api/v1/streaks/pact/{pact_id}
pub async fn list_for_pact(
    user: RequestUser,
    State(state): State<AppState>,
    Path(pact_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let pact = state
        .store
        .find_pact(pact_id)
        .await
        .tagged(ERROR_TAG)?
        .ok_or_else(|| CoreError::not_found("Pact", pact_id))?;
    ensure_pact_participant(user.user_id, pact.creator_user_id, pact.partner_user_id)?;

    let streaks = state
        .store
        .list_pact_streaks(pact_id)
        .await
        .tagged(ERROR_TAG)?;
    Ok(Json(DataResponse {
        data: enrich_all(streaks),
    }))
}

/// GET /api/v1/streaks/{id}
pub async fn get_by_id(
    user: RequestUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let streak = load_owned(&state, &user, id, Action::View, "streak").await?;
    let frequency = goal_frequency(&state, streak.habit_goal_id).await?;
    Ok(Json(DataResponse {
        data: EnrichedStreak::new(streak, frequency),
    }))
}

/// GET /api/v1/streaks/{id}/history?limit=
pub async fn list_history(
    user: RequestUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<LimitParams>,
) -> AppResult<impl IntoResponse> {
    load_owned(&state, &user, id, Action::View, "streak history").await?;
    let history = state
        .store
        .list_streak_history(id, params.limit.map(|l| l.clamp(1, MAX_LIMIT)))
        .await
        .tagged(ERROR_TAG)?;
    Ok(Json(DataResponse { data: history }))
}

/// PUT /api/v1/streaks/{id}/grace
///
/// Spends one grace day to cover yesterday. Fails with 400 once the
/// allowance is used up; the counter is never pushed past it.
pub async fn use_grace_day(
    user: RequestUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let streak = load_owned(&state, &user, id, Action::Modify, "streak").await?;
    if !can_use_grace_period(streak.grace_period_days, streak.grace_days_used) {
        return Err(CoreError::Exhausted(NO_GRACE_DAYS.into()).into());
    }

    let streak = state
        .store
        .use_grace_day(id, yesterday())
        .await
        .tagged(ERROR_TAG)?
        .ok_or_else(|| CoreError::Exhausted(NO_GRACE_DAYS.into()))?;

    state
        .store
        .append_streak_history(&NewStreakHistory {
            streak_id: streak.id,
            user_id: streak.user_id,
            checkin_id: None,
            event_type: StreakEventType::GraceUsed,
            event_date: today(),
            streak_before: streak.current_streak,
            streak_after: streak.current_streak,
            milestone_reached: None,
        })
        .await
        .tagged(ERROR_TAG)?;

    tracing::info!(
        user_id = %user.user_id,
        streak_id = id,
        grace_days_used = streak.grace_days_used,
        "Grace day used"
    );

    let frequency = goal_frequency(&state, streak.habit_goal_id).await?;
    Ok(Json(DataResponse {
        data: EnrichedStreak::new(streak, frequency),
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
    resource: &str,
) -> AppResult<Streak> {
    let streak = state
        .store
        .find_streak(id)
        .await
        .tagged(ERROR_TAG)?
        .ok_or_else(|| CoreError::not_found("Streak", id))?;
    ensure_owner(user.user_id, streak.user_id, action, resource)?;
    Ok(streak)
}

/// The habit's frequency, or daily if the goal has gone away.
async fn goal_frequency(state: &AppState, habit_goal_id: DbId) -> AppResult<FrequencyType> {
    let goal = state
        .store
        .find_habit_goal(habit_goal_id)
        .await
        .tagged(ERROR_TAG)?;
    Ok(goal.map(|g| g.frequency_type).unwrap_or_default())
}
