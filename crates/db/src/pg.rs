//! [`HabitStore`] over a PostgreSQL pool, delegating to the repositories.

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
use crate::repositories::{HabitCheckinRepo, HabitGoalRepo, PactMemberRepo, PactRepo, StreakRepo};
use crate::store::HabitStore;
use crate::DbPool;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl HabitStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }

    // -- habit goals --

    async fn create_habit_goal(&self, input: &NewHabitGoal) -> StoreResult<HabitGoal> {
        Ok(HabitGoalRepo::create(&self.pool, input).await?)
    }

    async fn find_habit_goal(&self, id: DbId) -> StoreResult<Option<HabitGoal>> {
        Ok(HabitGoalRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_user_habit_goals(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<HabitGoal>> {
        Ok(HabitGoalRepo::list_by_user(&self.pool, user_id, limit, offset).await?)
    }

    async fn list_template_goals(
        &self,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<HabitGoal>> {
        Ok(HabitGoalRepo::list_shared(&self.pool, true, category, limit, offset).await?)
    }

    async fn list_public_goals(
        &self,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<HabitGoal>> {
        Ok(HabitGoalRepo::list_shared(&self.pool, false, category, limit, offset).await?)
    }

    async fn search_habit_goals(&self, term: &str, limit: i64) -> StoreResult<Vec<HabitGoal>> {
        Ok(HabitGoalRepo::search_by_name(&self.pool, term, limit).await?)
    }

    async fn update_habit_goal(
        &self,
        id: DbId,
        input: &UpdateHabitGoal,
    ) -> StoreResult<Option<HabitGoal>> {
        Ok(HabitGoalRepo::update(&self.pool, id, input).await?)
    }

    async fn increment_goal_usage(&self, id: DbId) -> StoreResult<()> {
        Ok(HabitGoalRepo::increment_usage(&self.pool, id).await?)
    }

    async fn delete_habit_goal(&self, id: DbId, user_id: UserId) -> StoreResult<bool> {
        Ok(HabitGoalRepo::delete(&self.pool, id, user_id).await?)
    }

    // -- pacts --

    async fn create_pact(&self, input: &NewPact) -> StoreResult<Pact> {
        Ok(PactRepo::create(&self.pool, input).await?)
    }

    async fn find_pact(&self, id: DbId) -> StoreResult<Option<Pact>> {
        Ok(PactRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_pact_with_goal(&self, id: DbId) -> StoreResult<Option<PactWithGoal>> {
        Ok(PactRepo::find_with_goal(&self.pool, id).await?)
    }

    async fn list_user_pacts(
        &self,
        user_id: UserId,
        status: Option<PactStatus>,
        limit: Option<i64>,
        offset: i64,
    ) -> StoreResult<Vec<PactWithGoal>> {
        Ok(PactRepo::list_for_user(&self.pool, user_id, status, limit, offset).await?)
    }

    async fn list_pending_invites(&self, user_id: UserId) -> StoreResult<Vec<PactWithGoal>> {
        Ok(PactRepo::list_pending_invites(&self.pool, user_id).await?)
    }

    async fn activate_pact(&self, id: DbId, start: Timestamp) -> StoreResult<Option<Pact>> {
        Ok(PactRepo::activate(&self.pool, id, start).await?)
    }

    async fn end_pact(&self, id: DbId, outcome: &PactOutcome) -> StoreResult<Option<Pact>> {
        Ok(PactRepo::finish(&self.pool, id, outcome).await?)
    }

    async fn delete_pact(&self, id: DbId, user_id: UserId) -> StoreResult<bool> {
        Ok(PactRepo::delete_pending(&self.pool, id, user_id).await?)
    }

    async fn list_active_pacts_ending_before(&self, now: Timestamp) -> StoreResult<Vec<Pact>> {
        Ok(PactRepo::list_active_ending_before(&self.pool, now).await?)
    }

    async fn list_pending_pacts_created_before(&self, cutoff: Timestamp) -> StoreResult<Vec<Pact>> {
        Ok(PactRepo::list_pending_created_before(&self.pool, cutoff).await?)
    }

    // -- pact members --

    async fn add_pact_member(&self, input: &NewPactMember) -> StoreResult<PactMember> {
        Ok(PactMemberRepo::create(&self.pool, input).await?)
    }

    async fn list_pact_members(&self, pact_id: DbId) -> StoreResult<Vec<PactMember>> {
        Ok(PactMemberRepo::list_by_pact(&self.pool, pact_id).await?)
    }

    async fn find_pact_member(
        &self,
        pact_id: DbId,
        user_id: UserId,
    ) -> StoreResult<Option<PactMember>> {
        Ok(PactMemberRepo::find_by_pact_and_user(&self.pool, pact_id, user_id).await?)
    }

    async fn activate_pact_member(
        &self,
        pact_id: DbId,
        user_id: UserId,
        joined_at: Timestamp,
    ) -> StoreResult<Option<PactMember>> {
        Ok(PactMemberRepo::activate(&self.pool, pact_id, user_id, joined_at).await?)
    }

    async fn leave_pact(
        &self,
        pact_id: DbId,
        user_id: UserId,
        left_at: Timestamp,
    ) -> StoreResult<Option<PactMember>> {
        Ok(PactMemberRepo::leave(&self.pool, pact_id, user_id, left_at).await?)
    }

    async fn record_member_checkin(
        &self,
        member_id: DbId,
        completed: bool,
        current_streak: Option<i32>,
    ) -> StoreResult<Option<PactMember>> {
        Ok(PactMemberRepo::record_checkin(&self.pool, member_id, completed, current_streak).await?)
    }

    // -- streaks --

    async fn create_streak(&self, input: &NewStreak) -> StoreResult<Streak> {
        Ok(StreakRepo::create(&self.pool, input).await?)
    }

    async fn get_or_create_streak(&self, input: &NewStreak) -> StoreResult<Streak> {
        Ok(StreakRepo::get_or_create(&self.pool, input).await?)
    }

    async fn find_streak(&self, id: DbId) -> StoreResult<Option<Streak>> {
        Ok(StreakRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_streak_by_habit(
        &self,
        user_id: UserId,
        habit_goal_id: DbId,
    ) -> StoreResult<Option<Streak>> {
        Ok(StreakRepo::find_by_user_and_habit(&self.pool, user_id, habit_goal_id).await?)
    }

    async fn list_user_streaks(
        &self,
        user_id: UserId,
        is_active: Option<bool>,
    ) -> StoreResult<Vec<Streak>> {
        Ok(StreakRepo::list_by_user(&self.pool, user_id, is_active).await?)
    }

    async fn list_pact_streaks(&self, pact_id: DbId) -> StoreResult<Vec<Streak>> {
        Ok(StreakRepo::list_by_pact(&self.pool, pact_id).await?)
    }

    async fn list_top_streaks(&self, limit: i64) -> StoreResult<Vec<Streak>> {
        Ok(StreakRepo::list_top(&self.pool, limit).await?)
    }

    async fn save_streak_progress(
        &self,
        id: DbId,
        state: &StreakState,
    ) -> StoreResult<Option<Streak>> {
        Ok(StreakRepo::save_progress(&self.pool, id, state).await?)
    }

    async fn use_grace_day(&self, id: DbId, covered_date: Date) -> StoreResult<Option<Streak>> {
        Ok(StreakRepo::use_grace_day(&self.pool, id, covered_date).await?)
    }

    async fn deactivate_pact_streaks(&self, pact_id: DbId) -> StoreResult<u64> {
        Ok(StreakRepo::deactivate_by_pact(&self.pool, pact_id).await?)
    }

    // -- streak history --

    async fn append_streak_history(&self, input: &NewStreakHistory) -> StoreResult<StreakHistory> {
        Ok(StreakRepo::append_history(&self.pool, input).await?)
    }

    async fn list_streak_history(
        &self,
        streak_id: DbId,
        limit: Option<i64>,
    ) -> StoreResult<Vec<StreakHistory>> {
        Ok(StreakRepo::list_history(&self.pool, streak_id, limit).await?)
    }

    async fn list_milestone_history(&self, user_id: UserId) -> StoreResult<Vec<StreakHistory>> {
        Ok(StreakRepo::list_milestones(&self.pool, user_id).await?)
    }

    // -- checkins --

    async fn upsert_checkin(&self, input: &UpsertCheckin) -> StoreResult<HabitCheckin> {
        Ok(HabitCheckinRepo::upsert(&self.pool, input).await?)
    }

    async fn find_checkin(&self, id: DbId) -> StoreResult<Option<HabitCheckin>> {
        Ok(HabitCheckinRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_checkins_for_date(
        &self,
        user_id: UserId,
        date: Date,
        habit_goal_id: Option<DbId>,
    ) -> StoreResult<Vec<HabitCheckin>> {
        Ok(HabitCheckinRepo::list_for_date(&self.pool, user_id, date, habit_goal_id).await?)
    }

    async fn list_checkins_in_range(
        &self,
        user_id: UserId,
        start: Date,
        end: Date,
        habit_goal_id: Option<DbId>,
    ) -> StoreResult<Vec<HabitCheckin>> {
        Ok(HabitCheckinRepo::list_in_range(&self.pool, user_id, start, end, habit_goal_id).await?)
    }

    async fn list_pact_checkins(
        &self,
        pact_id: DbId,
        limit: Option<i64>,
        offset: i64,
    ) -> StoreResult<Vec<HabitCheckin>> {
        Ok(HabitCheckinRepo::list_by_pact(&self.pool, pact_id, limit, offset).await?)
    }

    async fn update_checkin(
        &self,
        id: DbId,
        changes: &CheckinChanges,
    ) -> StoreResult<Option<HabitCheckin>> {
        Ok(HabitCheckinRepo::update(&self.pool, id, changes).await?)
    }

    async fn delete_checkin(&self, id: DbId, user_id: UserId) -> StoreResult<bool> {
        Ok(HabitCheckinRepo::delete(&self.pool, id, user_id).await?)
    }

    async fn pact_checkin_tally(&self, pact_id: DbId, user_id: UserId) -> StoreResult<CheckinTally> {
        Ok(HabitCheckinRepo::tally_for_pact(&self.pool, pact_id, user_id).await?)
    }
}
