//! Pact vocabulary and the pure rules around a pact's lifecycle:
//! parameter validation, completion statistics, date arithmetic, role
//! lookups and display labels.

use chrono::Duration;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::{Timestamp, UserId};

/// Durations a pact may run for, in days.
pub const VALID_DURATIONS: [i32; 5] = [7, 14, 30, 60, 90];

pub const DEFAULT_DURATION_DAYS: i32 = 30;

/// Days a pending invitation stays open before the sweep expires it.
pub const DEFAULT_INVITATION_EXPIRY_DAYS: i64 = 7;

/// Rates closer than this (in percentage points) are a draw.
const DRAW_TOLERANCE: f64 = 0.01;

string_enum! {
    pub enum PactStatus {
        Pending => "pending",
        Active => "active",
        Completed => "completed",
        Abandoned => "abandoned",
        Expired => "expired",
    }
}

impl PactStatus {
    /// Completed, abandoned and expired pacts never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned | Self::Expired)
    }
}

string_enum! {
    pub enum PactType {
        Accountability => "accountability",
        Challenge => "challenge",
        Support => "support",
    }
}

string_enum! {
    pub enum ConsequenceType {
        None => "none",
        Donation => "donation",
        Dare => "dare",
        Custom => "custom",
    }
}

string_enum! {
    /// Why a pact reached a terminal state.
    pub enum EndReason {
        Completed => "completed",
        Expired => "expired",
        AbandonedCreator => "abandoned_creator",
        AbandonedPartner => "abandoned_partner",
    }
}

string_enum! {
    pub enum MemberRole {
        Creator => "creator",
        Partner => "partner",
    }
}

string_enum! {
    pub enum MemberStatus {
        Pending => "pending",
        Active => "active",
        Left => "left",
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// The caller-controlled knobs of a new pact, as received.
#[derive(Debug, Clone, Default)]
pub struct PactParams<'a> {
    pub duration_days: Option<i32>,
    pub consequence_type: Option<&'a str>,
    pub consequence_details: Option<&'a serde_json::Value>,
}

/// Check duration and consequence settings before a pact is created.
///
/// A donation consequence needs a positive `amount`; missing details count
/// as zero.
pub fn validate_pact_params(params: &PactParams<'_>) -> Result<(), CoreError> {
    if let Some(days) = params.duration_days {
        if !VALID_DURATIONS.contains(&days) {
            return Err(CoreError::Validation(format!(
                "Duration must be one of: {} days",
                join(&VALID_DURATIONS)
            )));
        }
    }

    let Some(raw) = params.consequence_type else {
        return Ok(());
    };

    let consequence: ConsequenceType = raw.parse().map_err(|_| {
        let names: Vec<&str> = ConsequenceType::ALL.iter().map(|c| c.as_str()).collect();
        CoreError::Validation(format!(
            "Consequence type must be one of: {}",
            names.join(", ")
        ))
    })?;

    if consequence == ConsequenceType::Donation {
        let amount = params
            .consequence_details
            .and_then(|d| d.get("amount"))
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(0.0);
        if amount <= 0.0 {
            return Err(CoreError::Validation(
                "Donation amount must be greater than 0".to_string(),
            ));
        }
    }

    Ok(())
}

fn join(values: &[i32]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Completion statistics
// ---------------------------------------------------------------------------

/// Completed vs. total checkins for one participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckinTally {
    pub completed: i32,
    pub total: i32,
}

impl CheckinTally {
    /// Completion percentage rounded to two decimals; zero when empty.
    pub fn rate(self) -> f64 {
        if self.total <= 0 {
            return 0.0;
        }
        let ratio = f64::from(self.completed) / f64::from(self.total);
        (ratio * 10_000.0).round() / 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PactCompletionStats {
    pub creator_completion_rate: f64,
    pub partner_completion_rate: f64,
    pub winner_id: Option<UserId>,
    pub is_draw: bool,
}

pub fn calculate_pact_completion_stats(
    creator: CheckinTally,
    partner: CheckinTally,
    creator_user_id: UserId,
    partner_user_id: UserId,
) -> PactCompletionStats {
    let creator_rate = creator.rate();
    let partner_rate = partner.rate();
    let is_draw = (creator_rate - partner_rate).abs() < DRAW_TOLERANCE;

    let winner_id = match is_draw {
        true => None,
        false if creator_rate > partner_rate => Some(creator_user_id),
        false => Some(partner_user_id),
    };

    PactCompletionStats {
        creator_completion_rate: creator_rate,
        partner_completion_rate: partner_rate,
        winner_id,
        is_draw,
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// An active pact whose end date has passed.
pub fn should_expire_pact(status: PactStatus, end_date: Option<Timestamp>, now: Timestamp) -> bool {
    status == PactStatus::Active && end_date.is_some_and(|end| now > end)
}

/// More than `expiration_days` whole days since the invitation was sent.
pub fn has_invitation_expired(created_at: Timestamp, expiration_days: i64, now: Timestamp) -> bool {
    (now - created_at).num_days() > expiration_days
}

/// Whole days left, rounded up, never negative.
pub fn days_remaining(end_date: Option<Timestamp>, now: Timestamp) -> i64 {
    let Some(end) = end_date else {
        return 0;
    };
    let remaining_ms = (end - now).num_milliseconds();
    if remaining_ms <= 0 {
        return 0;
    }
    let day_ms = Duration::days(1).num_milliseconds();
    (remaining_ms + day_ms - 1) / day_ms
}

/// Elapsed share of the pact window as a whole percent clamped to `0..=100`.
pub fn pact_progress(start_date: Option<Timestamp>, end_date: Option<Timestamp>, now: Timestamp) -> i32 {
    let (Some(start), Some(end)) = (start_date, end_date) else {
        return 0;
    };

    let total = (end - start).num_milliseconds();
    if total <= 0 {
        return 100;
    }
    let elapsed = (now - start).num_milliseconds();
    let percent = (elapsed as f64 / total as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as i32
}

pub fn calculate_end_date(start_date: Timestamp, duration_days: i32) -> Timestamp {
    start_date + Duration::days(i64::from(duration_days))
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

pub fn is_user_in_pact(user_id: UserId, creator_user_id: UserId, partner_user_id: Option<UserId>) -> bool {
    user_id == creator_user_id || partner_user_id == Some(user_id)
}

pub fn is_creator(user_id: UserId, creator_user_id: UserId) -> bool {
    user_id == creator_user_id
}

/// The other participant, or `None` if `user_id` is not in the pact (or the
/// pact is solo).
pub fn partner_user_id_for(
    user_id: UserId,
    creator_user_id: UserId,
    partner_user_id: Option<UserId>,
) -> Option<UserId> {
    if user_id == creator_user_id {
        partner_user_id
    } else if partner_user_id == Some(user_id) {
        Some(creator_user_id)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

pub fn format_pact_duration(duration_days: i32) -> String {
    match duration_days {
        7 => "1 week".to_string(),
        14 => "2 weeks".to_string(),
        30 => "1 month".to_string(),
        60 => "2 months".to_string(),
        90 => "3 months".to_string(),
        n => format!("{n} days"),
    }
}

/// Label and UI color for a pact status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusInfo {
    pub label: &'static str,
    pub color: &'static str,
}

pub fn pact_status_info(status: PactStatus) -> StatusInfo {
    let (label, color) = match status {
        PactStatus::Pending => ("Waiting for Partner", "warning"),
        PactStatus::Active => ("In Progress", "success"),
        PactStatus::Completed => ("Completed", "info"),
        PactStatus::Abandoned => ("Abandoned", "error"),
        PactStatus::Expired => ("Expired", "neutral"),
    };
    StatusInfo { label, color }
}

string_enum! {
    /// Entries of a pact's activity feed.
    pub enum PactActivityKind {
        CheckinCompleted => "checkin_completed",
        CheckinSkipped => "checkin_skipped",
        CelebrationSent => "celebration_sent",
        EncouragementSent => "encouragement_sent",
        StreakMilestone => "streak_milestone",
        StreakBroken => "streak_broken",
        PartnerJoined => "partner_joined",
        PactStarted => "pact_started",
        PactCompleted => "pact_completed",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityDisplay {
    pub message: String,
    pub emoji: &'static str,
}

/// Feed message for an activity performed by `user_name`.
pub fn activity_display(kind: PactActivityKind, user_name: &str) -> ActivityDisplay {
    let (message, emoji) = match kind {
        PactActivityKind::CheckinCompleted => (format!("{user_name} completed their habit!"), "✅"),
        PactActivityKind::CheckinSkipped => (format!("{user_name} skipped today"), "⏭️"),
        PactActivityKind::CelebrationSent => (format!("{user_name} sent a celebration!"), "🎉"),
        PactActivityKind::EncouragementSent => (format!("{user_name} sent encouragement"), "💪"),
        PactActivityKind::StreakMilestone => (format!("{user_name} hit a streak milestone!"), "🔥"),
        PactActivityKind::StreakBroken => (format!("{user_name}'s streak was reset"), "😢"),
        PactActivityKind::PartnerJoined => (format!("{user_name} joined the pact!"), "🤝"),
        PactActivityKind::PactStarted => ("Pact has started!".to_string(), "🚀"),
        PactActivityKind::PactCompleted => ("Pact completed!".to_string(), "🏆"),
    };
    ActivityDisplay { message, emoji }
}
