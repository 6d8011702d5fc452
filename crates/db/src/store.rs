//! The persistence port every handler and background job talks to.
//!
//! Two implementations ship with the crate: [`crate::pg::PgStore`] over a
//! PostgreSQL pool and [`crate::memory::MemoryStore`] for tests and local
//! runs without a database. Lookups return `Ok(None)` for missing rows;
//! mutations keyed by id return `Ok(None)` when nothing matched.

use async_trait::async_trait;
use habits_core::pacts::{CheckinTally, PactStatus};
use habits_core::streaks::StreakState;
use habits_core::types::{Date, DbId, Timestamp, UserId};

use crate::error::StoreResult;
use crate::models::habit_checkin::{CheckinChanges, HabitCheckin, UpsertCheckin};
use crate::models::habit_goal::{HabitGoal, NewHabitGoal, UpdateHabitGoal};
use crate::models::pact::{NewPact, Pact, PactOutcome, PactWithGoal};
use crate::models::pact_member::{NewPactMember, PactMember};
use crate::models::streak::{NewStreak, NewStreakHistory, Streak, StreakHistory};

#[async_trait]
pub trait HabitStore: Send + Sync {
    /// Round-trip to the backing store.
    async fn ping(&self) -> StoreResult<()>;

    // -- habit goals --

    async fn create_habit_goal(&self, input: &NewHabitGoal) -> StoreResult<HabitGoal>;
    async fn find_habit_goal(&self, id: DbId) -> StoreResult<Option<HabitGoal>>;
    async fn list_user_habit_goals(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<HabitGoal>>;
    /// Templates, most used first.
    async fn list_template_goals(
        &self,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<HabitGoal>>;
    /// Public goals, most used first.
    async fn list_public_goals(
        &self,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<HabitGoal>>;
    /// Case-insensitive name substring search over templates and public goals.
    async fn search_habit_goals(&self, term: &str, limit: i64) -> StoreResult<Vec<HabitGoal>>;
    async fn update_habit_goal(
        &self,
        id: DbId,
        input: &UpdateHabitGoal,
    ) -> StoreResult<Option<HabitGoal>>;
    async fn increment_goal_usage(&self, id: DbId) -> StoreResult<()>;
    /// Deletes only a non-template goal created by `user_id`.
    async fn delete_habit_goal(&self, id: DbId, user_id: UserId) -> StoreResult<bool>;

    // -- pacts --

    async fn create_pact(&self, input: &NewPact) -> StoreResult<Pact>;
    async fn find_pact(&self, id: DbId) -> StoreResult<Option<Pact>>;
    async fn find_pact_with_goal(&self, id: DbId) -> StoreResult<Option<PactWithGoal>>;
    /// Pacts where the user is creator or partner, newest first.
    async fn list_user_pacts(
        &self,
        user_id: UserId,
        status: Option<PactStatus>,
        limit: Option<i64>,
        offset: i64,
    ) -> StoreResult<Vec<PactWithGoal>>;
    /// Pending pacts inviting `user_id` as partner, newest first.
    async fn list_pending_invites(&self, user_id: UserId) -> StoreResult<Vec<PactWithGoal>>;
    /// Set status `active`, `start_date = start`, `end_date = start + duration`.
    async fn activate_pact(&self, id: DbId, start: Timestamp) -> StoreResult<Option<Pact>>;
    /// Move a pact into a terminal state.
    async fn end_pact(&self, id: DbId, outcome: &PactOutcome) -> StoreResult<Option<Pact>>;
    /// Deletes only a `pending` pact created by `user_id`.
    async fn delete_pact(&self, id: DbId, user_id: UserId) -> StoreResult<bool>;
    async fn list_active_pacts_ending_before(&self, now: Timestamp) -> StoreResult<Vec<Pact>>;
    async fn list_pending_pacts_created_before(&self, cutoff: Timestamp) -> StoreResult<Vec<Pact>>;

    // -- pact members --

    async fn add_pact_member(&self, input: &NewPactMember) -> StoreResult<PactMember>;
    /// Members ordered creator first.
    async fn list_pact_members(&self, pact_id: DbId) -> StoreResult<Vec<PactMember>>;
    async fn find_pact_member(&self, pact_id: DbId, user_id: UserId)
        -> StoreResult<Option<PactMember>>;
    async fn activate_pact_member(
        &self,
        pact_id: DbId,
        user_id: UserId,
        joined_at: Timestamp,
    ) -> StoreResult<Option<PactMember>>;
    async fn leave_pact(
        &self,
        pact_id: DbId,
        user_id: UserId,
        left_at: Timestamp,
    ) -> StoreResult<Option<PactMember>>;
    /// Count one more checkin (and completion, if `completed`), refresh the
    /// completion rate and mirror the member's streak.
    async fn record_member_checkin(
        &self,
        member_id: DbId,
        completed: bool,
        current_streak: Option<i32>,
    ) -> StoreResult<Option<PactMember>>;

    // -- streaks --

    async fn create_streak(&self, input: &NewStreak) -> StoreResult<Streak>;
    /// The streak for (user, habit goal, pact), created empty if missing.
    async fn get_or_create_streak(&self, input: &NewStreak) -> StoreResult<Streak>;
    async fn find_streak(&self, id: DbId) -> StoreResult<Option<Streak>>;
    /// The user's streak for a habit, preferring the one outside any pact.
    async fn find_streak_by_habit(
        &self,
        user_id: UserId,
        habit_goal_id: DbId,
    ) -> StoreResult<Option<Streak>>;
    /// Highest current streak first.
    async fn list_user_streaks(
        &self,
        user_id: UserId,
        is_active: Option<bool>,
    ) -> StoreResult<Vec<Streak>>;
    async fn list_pact_streaks(&self, pact_id: DbId) -> StoreResult<Vec<Streak>>;
    /// Active streaks above zero, highest first.
    async fn list_top_streaks(&self, limit: i64) -> StoreResult<Vec<Streak>>;
    async fn save_streak_progress(&self, id: DbId, state: &StreakState)
        -> StoreResult<Option<Streak>>;
    /// Consume one grace day covering `covered_date`. Returns `None` when the
    /// streak is missing or has no grace days left.
    async fn use_grace_day(&self, id: DbId, covered_date: Date) -> StoreResult<Option<Streak>>;
    /// Returns the number of streaks deactivated.
    async fn deactivate_pact_streaks(&self, pact_id: DbId) -> StoreResult<u64>;

    // -- streak history --

    async fn append_streak_history(&self, input: &NewStreakHistory) -> StoreResult<StreakHistory>;
    /// Newest event first.
    async fn list_streak_history(
        &self,
        streak_id: DbId,
        limit: Option<i64>,
    ) -> StoreResult<Vec<StreakHistory>>;
    /// Milestone events for the user, highest milestone first.
    async fn list_milestone_history(&self, user_id: UserId) -> StoreResult<Vec<StreakHistory>>;

    // -- checkins --

    async fn upsert_checkin(&self, input: &UpsertCheckin) -> StoreResult<HabitCheckin>;
    async fn find_checkin(&self, id: DbId) -> StoreResult<Option<HabitCheckin>>;
    async fn list_checkins_for_date(
        &self,
        user_id: UserId,
        date: Date,
        habit_goal_id: Option<DbId>,
    ) -> StoreResult<Vec<HabitCheckin>>;
    /// Inclusive date range, newest first.
    async fn list_checkins_in_range(
        &self,
        user_id: UserId,
        start: Date,
        end: Date,
        habit_goal_id: Option<DbId>,
    ) -> StoreResult<Vec<HabitCheckin>>;
    async fn list_pact_checkins(
        &self,
        pact_id: DbId,
        limit: Option<i64>,
        offset: i64,
    ) -> StoreResult<Vec<HabitCheckin>>;
    async fn update_checkin(
        &self,
        id: DbId,
        changes: &CheckinChanges,
    ) -> StoreResult<Option<HabitCheckin>>;
    /// Deletes only a checkin owned by `user_id`.
    async fn delete_checkin(&self, id: DbId, user_id: UserId) -> StoreResult<bool>;
    /// Completed vs. total checkins a user logged against a pact.
    async fn pact_checkin_tally(&self, pact_id: DbId, user_id: UserId)
        -> StoreResult<CheckinTally>;
}

