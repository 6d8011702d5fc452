//! Streak arithmetic: milestones, missed-day detection, risk levels,
//! display helpers and the rule that advances a streak on completion.
//!
//! Everything here is pure. Functions that depend on "now" take it as an
//! argument; the `*_string` helpers are thin wrappers over the server's
//! local clock (no timezone normalization).

use chrono::{Datelike, Duration, Local, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::habits::{FrequencyType, HabitSchedule};
use crate::types::Date;

/// Fixed streak lengths that trigger a celebration.
pub const STREAK_MILESTONES: [i32; 8] = [3, 7, 14, 30, 60, 90, 180, 365];

/// Hours after the last completion before a daily streak is at risk / critical.
const DAILY_AT_RISK_HOURS: f64 = 20.0;
const DAILY_CRITICAL_HOURS: f64 = 36.0;

/// Relaxed thresholds for non-daily habits (5 and 6 days).
const RELAXED_AT_RISK_HOURS: f64 = 120.0;
const RELAXED_CRITICAL_HOURS: f64 = 144.0;

string_enum! {
    /// How close a streak is to being broken.
    pub enum RiskLevel {
        Safe => "safe",
        AtRisk => "at_risk",
        Critical => "critical",
    }
}

string_enum! {
    /// Kinds of rows in the append-only streak history.
    pub enum StreakEventType {
        Completed => "completed",
        Missed => "missed",
        GraceUsed => "grace_used",
        MilestoneReached => "milestone_reached",
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Today's date on the server's local clock.
pub fn today() -> Date {
    Local::now().date_naive()
}

/// Yesterday's date on the server's local clock.
pub fn yesterday() -> Date {
    today() - Duration::days(1)
}

/// Today as `YYYY-MM-DD`.
pub fn today_date_string() -> String {
    today().format("%Y-%m-%d").to_string()
}

/// Yesterday as `YYYY-MM-DD`.
pub fn yesterday_date_string() -> String {
    yesterday().format("%Y-%m-%d").to_string()
}

pub fn is_today(date: Date) -> bool {
    date == today()
}

pub fn is_yesterday(date: Date) -> bool {
    date == yesterday()
}

// ---------------------------------------------------------------------------
// Milestones
// ---------------------------------------------------------------------------

/// Returns `Some(count)` only when `count` is exactly a milestone.
///
/// Jumping past a milestone (e.g. after a reset) never awards it
/// retroactively.
pub fn check_milestone_reached(streak_count: i32) -> Option<i32> {
    STREAK_MILESTONES
        .contains(&streak_count)
        .then_some(streak_count)
}

/// The first milestone strictly above `current_streak`.
pub fn next_milestone(current_streak: i32) -> Option<i32> {
    STREAK_MILESTONES
        .iter()
        .copied()
        .find(|m| *m > current_streak)
}

/// Progress from the previous milestone (or zero) towards the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneProgress {
    pub next_milestone: Option<i32>,
    /// Whole percent, `0..=100`.
    pub progress: i32,
}

pub fn milestone_progress(current_streak: i32) -> MilestoneProgress {
    let Some(next) = next_milestone(current_streak) else {
        return MilestoneProgress {
            next_milestone: None,
            progress: 100,
        };
    };

    let previous = STREAK_MILESTONES
        .iter()
        .copied()
        .filter(|m| *m <= current_streak)
        .last()
        .unwrap_or(0);

    let range = f64::from(next - previous);
    let progressed = f64::from(current_streak.max(0) - previous);
    let progress = ((progressed / range) * 100.0).round() as i32;

    MilestoneProgress {
        next_milestone: Some(next),
        progress: progress.clamp(0, 100),
    }
}

// ---------------------------------------------------------------------------
// Missed days and risk
// ---------------------------------------------------------------------------

/// Whether the habit was missed between `last_completed` and `today`.
///
/// - daily: a gap of more than one day.
/// - weekly with target days: any target weekday fell strictly between the
///   two dates.
/// - weekly N-times: more than one full week elapsed.
/// - anything else: daily rules.
///
/// No completion yet means nothing could have been missed.
pub fn was_day_missed(last_completed: Option<Date>, schedule: &HabitSchedule, today: Date) -> bool {
    let Some(last) = last_completed else {
        return false;
    };

    let days_diff = (today - last).num_days();

    match schedule.frequency_type {
        FrequencyType::Weekly if !schedule.target_days_of_week.is_empty() => (1..days_diff)
            .map(|offset| last + Duration::days(offset))
            .any(|day| {
                let weekday = day.weekday().num_days_from_sunday() as i16;
                schedule.target_days_of_week.contains(&weekday)
            }),
        FrequencyType::Weekly => days_diff / 7 > 1,
        FrequencyType::Daily | FrequencyType::Custom => days_diff > 1,
    }
}

/// Risk that the streak breaks, by hours elapsed since the last completed
/// day began.
pub fn streak_risk_level(
    last_completed: Option<Date>,
    frequency_type: FrequencyType,
    now: NaiveDateTime,
) -> RiskLevel {
    let Some(last) = last_completed else {
        return RiskLevel::Safe;
    };

    let elapsed = now - last.and_time(NaiveTime::MIN);
    let hours = elapsed.num_seconds() as f64 / 3600.0;

    let (at_risk, critical) = match frequency_type {
        FrequencyType::Daily => (DAILY_AT_RISK_HOURS, DAILY_CRITICAL_HOURS),
        _ => (RELAXED_AT_RISK_HOURS, RELAXED_CRITICAL_HOURS),
    };

    if hours >= critical {
        RiskLevel::Critical
    } else if hours >= at_risk {
        RiskLevel::AtRisk
    } else {
        RiskLevel::Safe
    }
}

/// Whether a streak still has an unused grace day.
pub fn can_use_grace_period(grace_period_days: i32, grace_days_used: i32) -> bool {
    grace_period_days > 0 && grace_days_used < grace_period_days
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

pub fn format_streak_display(streak_count: i32) -> String {
    match streak_count {
        0 => "No streak".to_string(),
        1 => "1 day".to_string(),
        n => format!("{n} days"),
    }
}

/// Tiered emoji for a streak count.
pub fn streak_emoji(streak_count: i32) -> &'static str {
    match streak_count {
        n if n >= 365 => "🏆",
        n if n >= 180 => "⭐",
        n if n >= 90 => "💎",
        n if n >= 60 => "🌟",
        n if n >= 30 => "🔥",
        n if n >= 14 => "💪",
        n if n >= 7 => "✨",
        n if n >= 3 => "👍",
        _ => "🌱",
    }
}

// ---------------------------------------------------------------------------
// Advancing a streak
// ---------------------------------------------------------------------------

/// The mutable bookkeeping of a streak row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreakState {
    pub current_streak: i32,
    pub current_streak_start_date: Option<Date>,
    pub longest_streak: i32,
    pub longest_streak_start_date: Option<Date>,
    pub longest_streak_end_date: Option<Date>,
    pub last_completed_date: Option<Date>,
    pub grace_days_used: i32,
    /// Most recent day forgiven by a grace day.
    pub grace_covered_date: Option<Date>,
}

/// Outcome of recording a completion against a streak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreakAdvance {
    /// The completion date was already counted; nothing changes.
    AlreadyCounted,
    /// The streak continued (or started from zero).
    Continued { before: i32, next: StreakState },
    /// A miss broke the streak; it restarts at one.
    Restarted { broken: i32, next: StreakState },
}

impl StreakAdvance {
    /// Streak count after the completion, if anything changed.
    pub fn streak_after(&self) -> Option<i32> {
        match self {
            Self::AlreadyCounted => None,
            Self::Continued { next, .. } | Self::Restarted { next, .. } => {
                Some(next.current_streak)
            }
        }
    }
}

/// Apply a completion on `completed_on` to `state`.
///
/// The gap is measured with [`was_day_missed`] against the completion date,
/// starting from the last completion, or from the grace-covered day when that
/// day itself follows the last completion without a miss. A restart clears
/// grace usage.
pub fn advance_streak(
    state: &StreakState,
    schedule: &HabitSchedule,
    completed_on: Date,
) -> StreakAdvance {
    if state
        .last_completed_date
        .is_some_and(|last| completed_on <= last)
    {
        return StreakAdvance::AlreadyCounted;
    }

    let anchor = match (state.last_completed_date, state.grace_covered_date) {
        (Some(last), Some(grace))
            if grace > last && !was_day_missed(Some(last), schedule, grace) =>
        {
            Some(grace)
        }
        (Some(last), _) => Some(last),
        (None, grace) => grace,
    };
    let missed = state.current_streak > 0 && was_day_missed(anchor, schedule, completed_on);

    let mut next = state.clone();
    next.last_completed_date = Some(completed_on);

    if missed {
        next.current_streak = 1;
        next.current_streak_start_date = Some(completed_on);
        next.grace_days_used = 0;
        next.grace_covered_date = None;
    } else {
        if state.current_streak == 0 {
            next.current_streak_start_date = Some(completed_on);
        }
        next.current_streak = state.current_streak + 1;
    }

    if next.current_streak > state.longest_streak {
        next.longest_streak = next.current_streak;
        next.longest_streak_start_date = next.current_streak_start_date;
        next.longest_streak_end_date = Some(completed_on);
    }

    if missed {
        StreakAdvance::Restarted {
            broken: state.current_streak,
            next,
        }
    } else {
        StreakAdvance::Continued {
            before: state.current_streak,
            next,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(d: Date, hour: u32) -> NaiveDateTime {
        d.and_hms_opt(hour, 0, 0).unwrap()
    }

    // -- milestones --

    #[test]
    fn every_milestone_is_reached_exactly() {
        for m in STREAK_MILESTONES {
            assert_eq!(check_milestone_reached(m), Some(m));
        }
    }

    #[test]
    fn non_milestones_are_not_reached() {
        for n in (0..=400).filter(|n| !STREAK_MILESTONES.contains(n)) {
            assert_eq!(check_milestone_reached(n), None, "{n} is not a milestone");
        }
    }

    #[test]
    fn progress_from_zero() {
        assert_eq!(
            milestone_progress(0),
            MilestoneProgress {
                next_milestone: Some(3),
                progress: 0
            }
        );
    }

    #[test]
    fn progress_past_last_milestone_is_complete() {
        assert_eq!(
            milestone_progress(400),
            MilestoneProgress {
                next_milestone: None,
                progress: 100
            }
        );
        assert_eq!(milestone_progress(365).next_milestone, None);
    }

    #[test]
    fn progress_between_milestones_is_rounded() {
        // 7 -> 14: 3 of 7 days = 42.86%
        assert_eq!(milestone_progress(10).next_milestone, Some(14));
        assert_eq!(milestone_progress(10).progress, 43);
        // On a milestone the range restarts.
        assert_eq!(milestone_progress(7).progress, 0);
        assert_eq!(milestone_progress(2).progress, 67);
    }

    // -- missed days --

    #[test]
    fn daily_gap_of_three_days_is_missed() {
        let today = date(2024, 5, 10);
        assert!(was_day_missed(
            Some(today - Duration::days(3)),
            &HabitSchedule::daily(),
            today
        ));
    }

    #[test]
    fn daily_completion_yesterday_is_not_missed() {
        let today = date(2024, 5, 10);
        assert!(!was_day_missed(
            Some(today - Duration::days(1)),
            &HabitSchedule::daily(),
            today
        ));
    }

    #[test]
    fn no_history_is_never_missed() {
        assert!(!was_day_missed(None, &HabitSchedule::daily(), date(2024, 5, 10)));
    }

    #[test]
    fn weekly_target_days_between_completions_are_missed() {
        // 2024-05-06 is a Monday. Target Wednesday (3).
        let schedule = HabitSchedule {
            frequency_type: FrequencyType::Weekly,
            frequency_count: 1,
            target_days_of_week: vec![3],
        };
        let monday = date(2024, 5, 6);
        // Thursday: Wednesday fell strictly between.
        assert!(was_day_missed(Some(monday), &schedule, date(2024, 5, 9)));
        // Wednesday itself is not strictly between Monday and Wednesday.
        assert!(!was_day_missed(Some(monday), &schedule, date(2024, 5, 8)));
    }

    #[test]
    fn weekly_count_allows_a_full_week() {
        let schedule = HabitSchedule {
            frequency_type: FrequencyType::Weekly,
            frequency_count: 3,
            target_days_of_week: vec![],
        };
        let last = date(2024, 5, 1);
        assert!(!was_day_missed(Some(last), &schedule, date(2024, 5, 14)));
        assert!(was_day_missed(Some(last), &schedule, date(2024, 5, 15)));
    }

    #[test]
    fn custom_frequency_uses_daily_rules() {
        let schedule = HabitSchedule {
            frequency_type: FrequencyType::Custom,
            ..HabitSchedule::daily()
        };
        let today = date(2024, 5, 10);
        assert!(was_day_missed(Some(date(2024, 5, 8)), &schedule, today));
    }

    // -- risk --

    #[test]
    fn daily_risk_thresholds() {
        let last = date(2024, 5, 10);
        let daily = FrequencyType::Daily;
        assert_eq!(streak_risk_level(Some(last), daily, at(last, 19)), RiskLevel::Safe);
        assert_eq!(streak_risk_level(Some(last), daily, at(last, 20)), RiskLevel::AtRisk);
        let next_day = last + Duration::days(1);
        assert_eq!(streak_risk_level(Some(last), daily, at(next_day, 12)), RiskLevel::Critical);
    }

    #[test]
    fn relaxed_risk_thresholds_for_weekly() {
        let last = date(2024, 5, 10);
        let weekly = FrequencyType::Weekly;
        let day4 = last + Duration::days(4);
        let day5 = last + Duration::days(5);
        let day6 = last + Duration::days(6);
        assert_eq!(streak_risk_level(Some(last), weekly, at(day4, 0)), RiskLevel::Safe);
        assert_eq!(streak_risk_level(Some(last), weekly, at(day5, 0)), RiskLevel::AtRisk);
        assert_eq!(streak_risk_level(Some(last), weekly, at(day6, 0)), RiskLevel::Critical);
    }

    #[test]
    fn no_completion_is_safe() {
        assert_eq!(
            streak_risk_level(None, FrequencyType::Daily, at(date(2024, 5, 10), 23)),
            RiskLevel::Safe
        );
    }

    // -- display --

    #[test]
    fn display_text() {
        assert_eq!(format_streak_display(0), "No streak");
        assert_eq!(format_streak_display(1), "1 day");
        assert_eq!(format_streak_display(12), "12 days");
    }

    #[test]
    fn emoji_tiers() {
        assert_eq!(streak_emoji(0), "🌱");
        assert_eq!(streak_emoji(3), "👍");
        assert_eq!(streak_emoji(29), "💪");
        assert_eq!(streak_emoji(30), "🔥");
        assert_eq!(streak_emoji(1000), "🏆");
    }

    #[test]
    fn grace_availability() {
        assert!(can_use_grace_period(2, 1));
        assert!(!can_use_grace_period(2, 2));
        assert!(!can_use_grace_period(0, 0));
    }

    // -- advance --

    #[test]
    fn first_completion_starts_at_one() {
        let day = date(2024, 5, 10);
        let advance = advance_streak(&StreakState::default(), &HabitSchedule::daily(), day);
        assert_matches!(advance, StreakAdvance::Continued { before: 0, ref next } => {
            assert_eq!(next.current_streak, 1);
            assert_eq!(next.current_streak_start_date, Some(day));
            assert_eq!(next.longest_streak, 1);
            assert_eq!(next.last_completed_date, Some(day));
        });
    }

    #[test]
    fn consecutive_day_increments() {
        let state = StreakState {
            current_streak: 4,
            current_streak_start_date: Some(date(2024, 5, 6)),
            longest_streak: 10,
            last_completed_date: Some(date(2024, 5, 9)),
            ..Default::default()
        };
        let advance = advance_streak(&state, &HabitSchedule::daily(), date(2024, 5, 10));
        assert_matches!(advance, StreakAdvance::Continued { before: 4, ref next } => {
            assert_eq!(next.current_streak, 5);
            assert_eq!(next.longest_streak, 10);
            assert_eq!(next.current_streak_start_date, Some(date(2024, 5, 6)));
        });
    }

    #[test]
    fn same_day_is_already_counted() {
        let state = StreakState {
            current_streak: 1,
            last_completed_date: Some(date(2024, 5, 10)),
            ..Default::default()
        };
        assert_eq!(
            advance_streak(&state, &HabitSchedule::daily(), date(2024, 5, 10)),
            StreakAdvance::AlreadyCounted
        );
    }

    #[test]
    fn gap_resets_to_one_and_clears_grace() {
        let state = StreakState {
            current_streak: 6,
            longest_streak: 6,
            last_completed_date: Some(date(2024, 5, 5)),
            grace_days_used: 1,
            ..Default::default()
        };
        let advance = advance_streak(&state, &HabitSchedule::daily(), date(2024, 5, 10));
        assert_matches!(advance, StreakAdvance::Restarted { broken: 6, ref next } => {
            assert_eq!(next.current_streak, 1);
            assert_eq!(next.grace_days_used, 0);
            assert_eq!(next.longest_streak, 6);
            assert_eq!(next.current_streak_start_date, Some(date(2024, 5, 10)));
        });
    }

    #[test]
    fn grace_covered_day_bridges_a_miss() {
        let state = StreakState {
            current_streak: 6,
            longest_streak: 6,
            last_completed_date: Some(date(2024, 5, 8)),
            grace_days_used: 1,
            grace_covered_date: Some(date(2024, 5, 9)),
            ..Default::default()
        };
        let advance = advance_streak(&state, &HabitSchedule::daily(), date(2024, 5, 10));
        assert_eq!(advance.streak_after(), Some(7));
        assert_matches!(advance, StreakAdvance::Continued { .. });
    }

    #[test]
    fn one_grace_day_does_not_bridge_a_longer_gap() {
        let state = StreakState {
            current_streak: 6,
            longest_streak: 6,
            last_completed_date: Some(date(2024, 5, 1)),
            grace_days_used: 1,
            grace_covered_date: Some(date(2024, 5, 9)),
            ..Default::default()
        };
        let advance = advance_streak(&state, &HabitSchedule::daily(), date(2024, 5, 10));
        assert_matches!(advance, StreakAdvance::Restarted { broken: 6, ref next } => {
            assert_eq!(next.current_streak, 1);
            assert_eq!(next.grace_days_used, 0);
            assert_eq!(next.grace_covered_date, None);
        });
    }

    #[test]
    fn stale_grace_day_before_last_completion_is_ignored() {
        let state = StreakState {
            current_streak: 2,
            longest_streak: 2,
            last_completed_date: Some(date(2024, 5, 6)),
            grace_days_used: 1,
            grace_covered_date: Some(date(2024, 5, 4)),
            ..Default::default()
        };
        let advance = advance_streak(&state, &HabitSchedule::daily(), date(2024, 5, 9));
        assert_matches!(advance, StreakAdvance::Restarted { broken: 2, .. });
    }

    #[test]
    fn new_record_moves_longest_window() {
        let state = StreakState {
            current_streak: 3,
            current_streak_start_date: Some(date(2024, 5, 7)),
            longest_streak: 3,
            longest_streak_start_date: Some(date(2024, 5, 7)),
            longest_streak_end_date: Some(date(2024, 5, 9)),
            last_completed_date: Some(date(2024, 5, 9)),
            ..Default::default()
        };
        let StreakAdvance::Continued { next, .. } =
            advance_streak(&state, &HabitSchedule::daily(), date(2024, 5, 10))
        else {
            panic!("expected continuation");
        };
        assert_eq!(next.longest_streak, 4);
        assert_eq!(next.longest_streak_start_date, Some(date(2024, 5, 7)));
        assert_eq!(next.longest_streak_end_date, Some(date(2024, 5, 10)));
    }
}
