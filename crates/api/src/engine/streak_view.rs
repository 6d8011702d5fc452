//! Read-side projections of streak rows.

use chrono::{Local, NaiveDateTime};
use habits_core::habits::FrequencyType;
use habits_core::streaks::{
    format_streak_display, milestone_progress, streak_emoji, streak_risk_level, MilestoneProgress,
    RiskLevel,
};
use habits_core::types::{DbId, UserId};
use habits_db::models::streak::Streak;
use serde::Serialize;

/// A streak plus the computed fields clients render.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedStreak {
    #[serde(flatten)]
    pub streak: Streak,
    pub risk_level: RiskLevel,
    pub milestone_progress: MilestoneProgress,
    pub display_text: String,
    pub emoji: &'static str,
}

impl EnrichedStreak {
    pub fn new(streak: Streak, frequency_type: FrequencyType) -> Self {
        Self::at(streak, frequency_type, Local::now().naive_local())
    }

    pub fn at(streak: Streak, frequency_type: FrequencyType, now: NaiveDateTime) -> Self {
        let count = streak.current_streak;
        Self {
            risk_level: streak_risk_level(streak.last_completed_date, frequency_type, now),
            milestone_progress: milestone_progress(count),
            display_text: format_streak_display(count),
            emoji: streak_emoji(count),
            streak,
        }
    }
}

/// Enrich a list with daily risk thresholds.
pub fn enrich_all(streaks: Vec<Streak>) -> Vec<EnrichedStreak> {
    streaks
        .into_iter()
        .map(|s| EnrichedStreak::new(s, FrequencyType::Daily))
        .collect()
}

/// Leaderboard entry: display fields only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedStreak {
    #[serde(flatten)]
    pub streak: Streak,
    pub display_text: String,
    pub emoji: &'static str,
}

impl From<Streak> for RankedStreak {
    fn from(streak: Streak) -> Self {
        Self {
            display_text: format_streak_display(streak.current_streak),
            emoji: streak_emoji(streak.current_streak),
            streak,
        }
    }
}

/// Placeholder returned by `/streaks/habit/{id}` when the user has no
/// streak for that habit yet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyStreak {
    pub user_id: UserId,
    pub habit_goal_id: DbId,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub is_active: bool,
    pub risk_level: RiskLevel,
    pub milestone_progress: MilestoneProgress,
    pub display_text: String,
    pub emoji: &'static str,
}

impl EmptyStreak {
    pub fn new(user_id: UserId, habit_goal_id: DbId) -> Self {
        Self {
            user_id,
            habit_goal_id,
            current_streak: 0,
            longest_streak: 0,
            is_active: false,
            risk_level: RiskLevel::Safe,
            milestone_progress: milestone_progress(0),
            display_text: format_streak_display(0),
            emoji: streak_emoji(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use super::*;

    fn streak(current: i32, last: Option<NaiveDate>) -> Streak {
        let now = Utc::now();
        Streak {
            id: 1,
            user_id: Uuid::new_v4(),
            habit_goal_id: 2,
            pact_id: None,
            current_streak: current,
            current_streak_start_date: None,
            longest_streak: current,
            longest_streak_start_date: None,
            longest_streak_end_date: None,
            last_completed_date: last,
            grace_period_days: 0,
            grace_days_used: 0,
            last_grace_date: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn enrichment_uses_frequency_thresholds() {
        let last = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let now = NaiveDate::from_ymd_opt(2026, 5, 2)
            .unwrap()
            .and_hms_opt(2, 0, 0)
            .unwrap();

        let daily = EnrichedStreak::at(streak(7, Some(last)), FrequencyType::Daily, now);
        assert_eq!(daily.risk_level, RiskLevel::AtRisk);
        assert_eq!(daily.display_text, "7 days");
        assert_eq!(daily.milestone_progress.next_milestone, Some(14));

        let weekly = EnrichedStreak::at(streak(7, Some(last)), FrequencyType::Weekly, now);
        assert_eq!(weekly.risk_level, RiskLevel::Safe);
    }

    #[test]
    fn enriched_json_is_flat() {
        let enriched = EnrichedStreak::new(streak(3, None), FrequencyType::Daily);
        let json = serde_json::to_value(&enriched).unwrap();
        assert_eq!(json["currentStreak"], 3);
        assert_eq!(json["riskLevel"], "safe");
        assert_eq!(json["milestoneProgress"]["nextMilestone"], 7);
        assert_eq!(json["emoji"], "👍");
    }

    #[test]
    fn empty_streak_is_safe() {
        let empty = EmptyStreak::new(Uuid::new_v4(), 4);
        assert_eq!(empty.current_streak, 0);
        assert_eq!(empty.display_text, "No streak");
        assert_eq!(empty.risk_level, RiskLevel::Safe);
    }
}
