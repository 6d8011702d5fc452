//! Handlers for `/pacts`: creation, reads and the lifecycle transitions.
//!
//! ```text
//! pending --accept--> active --abandon--> abandoned
//!    |                  |
//!    +--decline--> abandoned   +--sweep--> completed | expired
//! ```
//!
//! Every precondition is checked before the first write.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use habits_core::access::{ensure_invited_partner, ensure_pact_participant};
use habits_core::error::CoreError;
use habits_core::pacts::{
    calculate_end_date, days_remaining, format_pact_duration, is_creator, pact_progress,
    pact_status_info, partner_user_id_for, validate_pact_params, ConsequenceType, EndReason,
    MemberRole, MemberStatus, PactParams, PactStatus, PactType, DEFAULT_DURATION_DAYS,
};
use habits_core::types::{DbId, UserId};
use habits_db::models::pact::{NewPact, Pact, PactOutcome, PactWithMembers};
use habits_db::models::pact_member::NewPactMember;
use habits_db::models::streak::NewStreak;
use serde::{Deserialize, Serialize};

use crate::error::{AppResult, StoreResultExt};
use crate::middleware::request_user::RequestUser;
use crate::notifications;
use crate::query::{clamp_offset, PactListParams, MAX_LIMIT};
use crate::response::{DataResponse, DeletedResponse};
use crate::state::AppState;

const ERROR_TAG: &str = "SQL:PACTS_ROUTES:ERROR";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePactRequest {
    pub habit_goal_id: Option<DbId>,
    /// Omit for a solo pact, which starts immediately.
    pub partner_user_id: Option<UserId>,
    pub pact_type: Option<String>,
    pub duration_days: Option<i32>,
    pub consequence_type: Option<String>,
    pub consequence_details: Option<serde_json::Value>,
}

/// `GET /pacts/{id}` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PactDetail {
    #[serde(flatten)]
    pub pact: PactWithMembers,
    pub days_remaining: i64,
    pub progress: i32,
    pub duration_label: String,
    pub status_label: &'static str,
    pub status_color: &'static str,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/v1/pacts
pub async fn create(
    user: RequestUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePactRequest>,
) -> AppResult<impl IntoResponse> {
    let habit_goal_id = input
        .habit_goal_id
        .ok_or_else(|| CoreError::Validation("habitGoalId is required".into()))?;

    validate_pact_params(&PactParams {
        duration_days: input.duration_days,
        consequence_type: input.consequence_type.as_deref(),
        consequence_details: input.consequence_details.as_ref(),
    })?;

    let pact_type = match input.pact_type.as_deref() {
        Some(raw) => raw.parse()?,
        None => PactType::Accountability,
    };
    let consequence_type = match input.consequence_type.as_deref() {
        Some(raw) => raw.parse()?,
        None => ConsequenceType::None,
    };
    if input.partner_user_id == Some(user.user_id) {
        return Err(CoreError::Validation("You cannot create a pact with yourself".into()).into());
    }

    state
        .store
        .find_habit_goal(habit_goal_id)
        .await
        .tagged(ERROR_TAG)?
        .ok_or_else(|| CoreError::not_found("Habit goal", habit_goal_id))?;

    let duration_days = input.duration_days.unwrap_or(DEFAULT_DURATION_DAYS);
    let now = Utc::now();
    let (status, start_date, end_date) = match input.partner_user_id {
        Some(_) => (PactStatus::Pending, None, None),
        None => (
            PactStatus::Active,
            Some(now),
            Some(calculate_end_date(now, duration_days)),
        ),
    };

    let pact = state
        .store
        .create_pact(&NewPact {
            creator_user_id: user.user_id,
            partner_user_id: input.partner_user_id,
            habit_goal_id,
            pact_type,
            status,
            duration_days,
            start_date,
            end_date,
            consequence_type,
            consequence_details: input.consequence_details,
        })
        .await
        .tagged(ERROR_TAG)?;

    state
        .store
        .add_pact_member(&NewPactMember {
            pact_id: pact.id,
            user_id: user.user_id,
            role: MemberRole::Creator,
            status: MemberStatus::Active,
            joined_at: Some(now),
        })
        .await
        .tagged(ERROR_TAG)?;

    if let Some(partner) = pact.partner_user_id {
        state
            .store
            .add_pact_member(&NewPactMember {
                pact_id: pact.id,
                user_id: partner,
                role: MemberRole::Partner,
                status: MemberStatus::Pending,
                joined_at: None,
            })
            .await
            .tagged(ERROR_TAG)?;
        state
            .notifier
            .enqueue(notifications::pact_invitation(&pact, partner, &user.locale));
    }

    if let Err(e) = state.store.increment_goal_usage(habit_goal_id).await {
        tracing::warn!(habit_goal_id, error = %e, "Failed to bump habit goal usage");
    }

    tracing::info!(
        user_id = %user.user_id,
        pact_id = pact.id,
        status = %pact.status,
        duration_days,
        "Pact created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: pact })))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/pacts?status=&limit=&offset=
pub async fn list(
    user: RequestUser,
    State(state): State<AppState>,
    Query(params): Query<PactListParams>,
) -> AppResult<impl IntoResponse> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<PactStatus>)
        .transpose()?;
    let pacts = state
        .store
        .list_user_pacts(
            user.user_id,
            status,
            params.limit.map(|l| l.clamp(1, MAX_LIMIT)),
            clamp_offset(params.offset),
        )
        .await
        .tagged(ERROR_TAG)?;
    Ok(Json(DataResponse { data: pacts }))
}

/// GET /api/v1/pacts/active
pub async fn list_active(
    user: RequestUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let pacts = state
        .store
        .list_user_pacts(user.user_id, Some(PactStatus::Active), None, 0)
        .await
        .tagged(ERROR_TAG)?;
    Ok(Json(DataResponse { data: pacts }))
}

/// GET /api/v1/pacts/invites
pub async fn list_invites(
    user: RequestUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let pacts = state
        .store
        .list_pending_invites(user.user_id)
        .await
        .tagged(ERROR_TAG)?;
    Ok(Json(DataResponse { data: pacts }))
}

/// GET /api/v1/pacts/{id}
pub async fn get_by_id(
    user: RequestUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let pact = state
        .store
        .find_pact_with_goal(id)
        .await
        .tagged(ERROR_TAG)?
        .ok_or_else(|| CoreError::not_found("Pact", id))?;
    ensure_pact_participant(
        user.user_id,
        pact.pact.creator_user_id,
        pact.pact.partner_user_id,
    )?;

    let members = state
        .store
        .list_pact_members(id)
        .await
        .tagged(ERROR_TAG)?;

    let now = Utc::now();
    let core = &pact.pact;
    let info = pact_status_info(core.status);
    let detail = PactDetail {
        days_remaining: days_remaining(core.end_date, now),
        progress: pact_progress(core.start_date, core.end_date, now),
        duration_label: format_pact_duration(core.duration_days),
        status_label: info.label,
        status_color: info.color,
        pact: PactWithMembers { pact, members },
    };
    Ok(Json(DataResponse { data: detail }))
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// PUT /api/v1/pacts/{id}/accept
///
/// Invited partner only, while pending. Activates the pact and both
/// members, and opens a pact streak for each participant.
pub async fn accept(
    user: RequestUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let pact = load_pact(&state, id).await?;
    ensure_invited_partner(user.user_id, pact.partner_user_id)?;
    ensure_status(&pact, PactStatus::Pending)?;

    let now = Utc::now();
    let pact = state
        .store
        .activate_pact(id, now)
        .await
        .tagged(ERROR_TAG)?
        .ok_or_else(|| CoreError::not_found("Pact", id))?;

    for participant in [Some(pact.creator_user_id), pact.partner_user_id]
        .into_iter()
        .flatten()
    {
        state
            .store
            .activate_pact_member(id, participant, now)
            .await
            .tagged(ERROR_TAG)?;
        state
            .store
            .get_or_create_streak(&NewStreak {
                user_id: participant,
                habit_goal_id: pact.habit_goal_id,
                pact_id: Some(id),
                grace_period_days: state.config.streak_grace_period_days,
            })
            .await
            .tagged(ERROR_TAG)?;
    }

    state
        .notifier
        .enqueue(notifications::pact_accepted(&pact, &user.locale));

    tracing::info!(user_id = %user.user_id, pact_id = id, "Pact accepted");
    Ok(Json(DataResponse { data: pact }))
}

/// PUT /api/v1/pacts/{id}/decline
pub async fn decline(
    user: RequestUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let pact = load_pact(&state, id).await?;
    ensure_invited_partner(user.user_id, pact.partner_user_id)?;
    ensure_status(&pact, PactStatus::Pending)?;

    let pact = state
        .store
        .end_pact(
            id,
            &PactOutcome::ended(PactStatus::Abandoned, EndReason::AbandonedPartner),
        )
        .await
        .tagged(ERROR_TAG)?
        .ok_or_else(|| CoreError::not_found("Pact", id))?;

    state
        .notifier
        .enqueue(notifications::pact_declined(&pact, &user.locale));

    tracing::info!(user_id = %user.user_id, pact_id = id, "Pact declined");
    Ok(Json(DataResponse { data: pact }))
}

/// PUT /api/v1/pacts/{id}/abandon
///
/// Either participant, while active. The abandoning member leaves and every
/// streak tied to the pact is deactivated.
pub async fn abandon(
    user: RequestUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let pact = load_pact(&state, id).await?;
    ensure_pact_participant(user.user_id, pact.creator_user_id, pact.partner_user_id)?;
    ensure_status(&pact, PactStatus::Active)?;

    let reason = if is_creator(user.user_id, pact.creator_user_id) {
        EndReason::AbandonedCreator
    } else {
        EndReason::AbandonedPartner
    };

    let pact = state
        .store
        .end_pact(id, &PactOutcome::ended(PactStatus::Abandoned, reason))
        .await
        .tagged(ERROR_TAG)?
        .ok_or_else(|| CoreError::not_found("Pact", id))?;
    state
        .store
        .leave_pact(id, user.user_id, Utc::now())
        .await
        .tagged(ERROR_TAG)?;
    let deactivated = state
        .store
        .deactivate_pact_streaks(id)
        .await
        .tagged(ERROR_TAG)?;

    if let Some(other) = partner_user_id_for(user.user_id, pact.creator_user_id, pact.partner_user_id)
    {
        state.notifier.enqueue(notifications::pact_abandoned(
            &pact,
            user.user_id,
            other,
            &user.locale,
        ));
    }

    tracing::info!(
        user_id = %user.user_id,
        pact_id = id,
        end_reason = %reason,
        deactivated,
        "Pact abandoned"
    );
    Ok(Json(DataResponse { data: pact }))
}

/// DELETE /api/v1/pacts/{id}
///
/// Only the creator of a still-pending pact may delete it.
pub async fn delete(
    user: RequestUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = state
        .store
        .delete_pact(id, user.user_id)
        .await
        .tagged(ERROR_TAG)?;
    if !deleted {
        return Err(CoreError::Forbidden("You cannot delete this pact".into()).into());
    }

    tracing::info!(user_id = %user.user_id, pact_id = id, "Pact deleted");
    Ok(Json(DataResponse {
        data: DeletedResponse { deleted: true },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_pact(state: &AppState, id: DbId) -> AppResult<Pact> {
    let pact = state
        .store
        .find_pact(id)
        .await
        .tagged(ERROR_TAG)?
        .ok_or_else(|| CoreError::not_found("Pact", id))?;
    Ok(pact)
}

fn ensure_status(pact: &Pact, expected: PactStatus) -> Result<(), CoreError> {
    if pact.status == expected {
        Ok(())
    } else {
        Err(CoreError::InvalidState(format!("Pact is not {expected}")))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn create_request_reads_camel_case() {
        let body: CreatePactRequest = serde_json::from_value(serde_json::json!({
            "habitGoalId": 4,
            "durationDays": 14,
            "consequenceType": "donation",
            "consequenceDetails": { "amount": 5 },
        }))
        .unwrap();
        assert_eq!(body.habit_goal_id, Some(4));
        assert_eq!(body.duration_days, Some(14));
        assert!(body.partner_user_id.is_none());
    }

    #[test]
    fn wrong_status_is_invalid_state() {
        let err = ensure_status_for(PactStatus::Active, PactStatus::Pending);
        assert_matches!(err, Err(CoreError::InvalidState(msg)) if msg == "Pact is not pending");
        assert!(ensure_status_for(PactStatus::Active, PactStatus::Active).is_ok());
    }

    fn ensure_status_for(actual: PactStatus, expected: PactStatus) -> Result<(), CoreError> {
        let now = Utc::now();
        let pact = Pact {
            id: 1,
            creator_user_id: uuid::Uuid::new_v4(),
            partner_user_id: None,
            habit_goal_id: 1,
            pact_type: PactType::Accountability,
            status: actual,
            duration_days: DEFAULT_DURATION_DAYS,
            start_date: None,
            end_date: None,
            consequence_type: ConsequenceType::None,
            consequence_details: None,
            end_reason_raw: None,
            winner_id: None,
            creator_completion_rate: None,
            partner_completion_rate: None,
            created_at: now,
            updated_at: now,
        };
        ensure_status(&pact, expected)
    }
}
