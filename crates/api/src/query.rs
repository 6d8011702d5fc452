//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Upper bound for any client-supplied `limit`.
pub const MAX_LIMIT: i64 = 100;

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// `limit` clamped to `1..=MAX_LIMIT`, or `default` when absent.
    pub fn limit_or(&self, default: i64) -> i64 {
        clamp_limit(self.limit, default)
    }

    pub fn offset(&self) -> i64 {
        clamp_offset(self.offset)
    }
}

pub fn clamp_limit(limit: Option<i64>, default: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, MAX_LIMIT)
}

pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// `?category=&limit=&offset=` for template and public goal listings.
#[derive(Debug, Deserialize)]
pub struct CategoryParams {
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `?query=&limit=` for habit goal search.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub limit: Option<i64>,
}

/// `?habitGoalId=` filter.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitFilterParams {
    pub habit_goal_id: Option<i64>,
}

/// `?startDate=&endDate=&habitGoalId=`. Dates are validated by the handler so
/// missing or malformed values produce the standard error envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub habit_goal_id: Option<i64>,
}

/// `?status=&limit=&offset=` for pact listings.
#[derive(Debug, Deserialize)]
pub struct PactListParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `?isActive=true|false`. Any other value means no filter.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakListParams {
    pub is_active: Option<String>,
}

impl StreakListParams {
    pub fn active_filter(&self) -> Option<bool> {
        match self.is_active.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        }
    }
}

/// `?limit=` alone.
#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}
