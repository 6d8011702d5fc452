//! In-process [`HabitStore`] used by tests and by local runs without
//! `DATABASE_URL`. Mirrors the PostgreSQL semantics, including the unique
//! keys and the cascades declared in the migrations.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use habits_core::habits::CheckinStatus;
use habits_core::pacts::{calculate_end_date, CheckinTally, MemberStatus, PactStatus};
use habits_core::streaks::{StreakEventType, StreakState};
use habits_core::types::{Date, DbId, Timestamp, UserId};
use tokio::sync::Mutex;

use crate::error::StoreResult;
use crate::models::habit_checkin::{CheckinChanges, HabitCheckin, UpsertCheckin};
use crate::models::habit_goal::{HabitGoal, NewHabitGoal, UpdateHabitGoal};
use crate::models::pact::{NewPact, Pact, PactOutcome, PactWithGoal};
use crate::models::pact_member::{NewPactMember, PactMember};
use crate::models::streak::{NewStreak, NewStreakHistory, Streak, StreakHistory};
use crate::store::HabitStore;

#[derive(Default)]
struct Tables {
    next_id: DbId,
    habit_goals: BTreeMap<DbId, HabitGoal>,
    pacts: BTreeMap<DbId, Pact>,
    pact_members: BTreeMap<DbId, PactMember>,
    streaks: BTreeMap<DbId, Streak>,
    streak_history: BTreeMap<DbId, StreakHistory>,
    habit_checkins: BTreeMap<DbId, HabitCheckin>,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn with_goal(&self, pact: &Pact) -> PactWithGoal {
        let goal = self.habit_goals.get(&pact.habit_goal_id);
        PactWithGoal {
            pact: pact.clone(),
            habit_goal_name: goal.map(|g| g.name.clone()),
            habit_goal_emoji: goal.and_then(|g| g.emoji.clone()),
            habit_goal_category: goal.and_then(|g| g.category.clone()),
        }
    }

    /// `ON DELETE` behaviour for a removed pact.
    fn detach_pact(&mut self, pact_id: DbId) {
        self.pact_members.retain(|_, m| m.pact_id != pact_id);
        for streak in self.streaks.values_mut().filter(|s| s.pact_id == Some(pact_id)) {
            streak.pact_id = None;
        }
        for checkin in self
            .habit_checkins
            .values_mut()
            .filter(|c| c.pact_id == Some(pact_id))
        {
            checkin.pact_id = None;
        }
    }
}

/// Apply `OFFSET`/`LIMIT` to an already ordered list.
fn page<T>(items: Vec<T>, limit: Option<i64>, offset: i64) -> Vec<T> {
    let skip = usize::try_from(offset).unwrap_or(0);
    let take = limit
        .and_then(|l| usize::try_from(l).ok())
        .unwrap_or(usize::MAX);
    items.into_iter().skip(skip).take(take).collect()
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HabitStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    // -- habit goals --

    async fn create_habit_goal(&self, input: &NewHabitGoal) -> StoreResult<HabitGoal> {
        let mut t = self.tables.lock().await;
        let now = Utc::now();
        let goal = HabitGoal {
            id: t.next_id(),
            name: input.name.clone(),
            description: input.description.clone(),
            category: input.category.clone(),
            emoji: input.emoji.clone(),
            frequency_type: input.frequency_type,
            frequency_count: input.frequency_count,
            target_days_of_week: input.target_days_of_week.clone(),
            created_by_user_id: input.created_by_user_id,
            is_template: input.is_template,
            is_public: input.is_public,
            usage_count: 0,
            created_at: now,
            updated_at: now,
        };
        t.habit_goals.insert(goal.id, goal.clone());
        Ok(goal)
    }

    async fn find_habit_goal(&self, id: DbId) -> StoreResult<Option<HabitGoal>> {
        Ok(self.tables.lock().await.habit_goals.get(&id).cloned())
    }

    async fn list_user_habit_goals(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<HabitGoal>> {
        let t = self.tables.lock().await;
        let mut goals: Vec<_> = t
            .habit_goals
            .values()
            .filter(|g| g.created_by_user_id == Some(user_id))
            .cloned()
            .collect();
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page(goals, Some(limit), offset))
    }

    async fn list_template_goals(
        &self,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<HabitGoal>> {
        let t = self.tables.lock().await;
        let mut goals: Vec<_> = t
            .habit_goals
            .values()
            .filter(|g| g.is_template)
            .filter(|g| category.is_none() || g.category.as_deref() == category)
            .cloned()
            .collect();
        goals.sort_by(|a, b| b.usage_count.cmp(&a.usage_count).then(a.id.cmp(&b.id)));
        Ok(page(goals, Some(limit), offset))
    }

    async fn list_public_goals(
        &self,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<HabitGoal>> {
        let t = self.tables.lock().await;
        let mut goals: Vec<_> = t
            .habit_goals
            .values()
            .filter(|g| g.is_public)
            .filter(|g| category.is_none() || g.category.as_deref() == category)
            .cloned()
            .collect();
        goals.sort_by(|a, b| b.usage_count.cmp(&a.usage_count).then(a.id.cmp(&b.id)));
        Ok(page(goals, Some(limit), offset))
    }

    async fn search_habit_goals(&self, term: &str, limit: i64) -> StoreResult<Vec<HabitGoal>> {
        let needle = term.to_lowercase();
        let t = self.tables.lock().await;
        let mut goals: Vec<_> = t
            .habit_goals
            .values()
            .filter(|g| g.is_template || g.is_public)
            .filter(|g| g.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        goals.sort_by(|a, b| b.usage_count.cmp(&a.usage_count).then(a.id.cmp(&b.id)));
        Ok(page(goals, Some(limit), 0))
    }

    async fn update_habit_goal(
        &self,
        id: DbId,
        input: &UpdateHabitGoal,
    ) -> StoreResult<Option<HabitGoal>> {
        let mut t = self.tables.lock().await;
        let Some(goal) = t.habit_goals.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            goal.name = name.clone();
        }
        if let Some(description) = &input.description {
            goal.description = Some(description.clone());
        }
        if let Some(category) = &input.category {
            goal.category = Some(category.clone());
        }
        if let Some(emoji) = &input.emoji {
            goal.emoji = Some(emoji.clone());
        }
        if let Some(frequency_type) = input.frequency_type {
            goal.frequency_type = frequency_type;
        }
        if let Some(count) = input.frequency_count {
            goal.frequency_count = count;
        }
        if let Some(days) = &input.target_days_of_week {
            goal.target_days_of_week = days.clone();
        }
        if let Some(is_public) = input.is_public {
            goal.is_public = is_public;
        }
        goal.updated_at = Utc::now();
        Ok(Some(goal.clone()))
    }

    async fn increment_goal_usage(&self, id: DbId) -> StoreResult<()> {
        let mut t = self.tables.lock().await;
        if let Some(goal) = t.habit_goals.get_mut(&id) {
            goal.usage_count += 1;
            goal.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_habit_goal(&self, id: DbId, user_id: UserId) -> StoreResult<bool> {
        let mut t = self.tables.lock().await;
        let deletable = t
            .habit_goals
            .get(&id)
            .is_some_and(|g| g.created_by_user_id == Some(user_id) && !g.is_template);
        if !deletable {
            return Ok(false);
        }
        t.habit_goals.remove(&id);

        let pact_ids: Vec<DbId> = t
            .pacts
            .values()
            .filter(|p| p.habit_goal_id == id)
            .map(|p| p.id)
            .collect();
        for pact_id in pact_ids {
            t.pacts.remove(&pact_id);
            t.detach_pact(pact_id);
        }
        t.streaks.retain(|_, s| s.habit_goal_id != id);
        let streak_ids: Vec<DbId> = t.streaks.keys().copied().collect();
        t.streak_history.retain(|_, h| streak_ids.contains(&h.streak_id));
        t.habit_checkins.retain(|_, c| c.habit_goal_id != id);
        Ok(true)
    }

    // -- pacts --

    async fn create_pact(&self, input: &NewPact) -> StoreResult<Pact> {
        let mut t = self.tables.lock().await;
        let now = Utc::now();
        let pact = Pact {
            id: t.next_id(),
            creator_user_id: input.creator_user_id,
            partner_user_id: input.partner_user_id,
            habit_goal_id: input.habit_goal_id,
            pact_type: input.pact_type,
            status: input.status,
            duration_days: input.duration_days,
            start_date: input.start_date,
            end_date: input.end_date,
            consequence_type: input.consequence_type,
            consequence_details: input.consequence_details.clone(),
            end_reason_raw: None,
            winner_id: None,
            creator_completion_rate: None,
            partner_completion_rate: None,
            created_at: now,
            updated_at: now,
        };
        t.pacts.insert(pact.id, pact.clone());
        Ok(pact)
    }

    async fn find_pact(&self, id: DbId) -> StoreResult<Option<Pact>> {
        Ok(self.tables.lock().await.pacts.get(&id).cloned())
    }

    async fn find_pact_with_goal(&self, id: DbId) -> StoreResult<Option<PactWithGoal>> {
        let t = self.tables.lock().await;
        Ok(t.pacts.get(&id).map(|p| t.with_goal(p)))
    }

    async fn list_user_pacts(
        &self,
        user_id: UserId,
        status: Option<PactStatus>,
        limit: Option<i64>,
        offset: i64,
    ) -> StoreResult<Vec<PactWithGoal>> {
        let t = self.tables.lock().await;
        let mut pacts: Vec<&Pact> = t
            .pacts
            .values()
            .filter(|p| p.creator_user_id == user_id || p.partner_user_id == Some(user_id))
            .filter(|p| status.is_none_or(|s| p.status == s))
            .collect();
        pacts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let pacts = pacts.into_iter().map(|p| t.with_goal(p)).collect();
        Ok(page(pacts, limit, offset))
    }

    async fn list_pending_invites(&self, user_id: UserId) -> StoreResult<Vec<PactWithGoal>> {
        let t = self.tables.lock().await;
        let mut pacts: Vec<&Pact> = t
            .pacts
            .values()
            .filter(|p| p.partner_user_id == Some(user_id) && p.status == PactStatus::Pending)
            .collect();
        pacts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(pacts.into_iter().map(|p| t.with_goal(p)).collect())
    }

    async fn activate_pact(&self, id: DbId, start: Timestamp) -> StoreResult<Option<Pact>> {
        let mut t = self.tables.lock().await;
        let Some(pact) = t.pacts.get_mut(&id) else {
            return Ok(None);
        };
        pact.status = PactStatus::Active;
        pact.start_date = Some(start);
        pact.end_date = Some(calculate_end_date(start, pact.duration_days));
        pact.updated_at = Utc::now();
        Ok(Some(pact.clone()))
    }

    async fn end_pact(&self, id: DbId, outcome: &PactOutcome) -> StoreResult<Option<Pact>> {
        let mut t = self.tables.lock().await;
        let Some(pact) = t.pacts.get_mut(&id) else {
            return Ok(None);
        };
        pact.status = outcome.status;
        pact.end_reason_raw = Some(outcome.end_reason.as_str().to_string());
        pact.winner_id = outcome.winner_id;
        if outcome.creator_completion_rate.is_some() {
            pact.creator_completion_rate = outcome.creator_completion_rate;
        }
        if outcome.partner_completion_rate.is_some() {
            pact.partner_completion_rate = outcome.partner_completion_rate;
        }
        pact.updated_at = Utc::now();
        Ok(Some(pact.clone()))
    }

    async fn delete_pact(&self, id: DbId, user_id: UserId) -> StoreResult<bool> {
        let mut t = self.tables.lock().await;
        let deletable = t
            .pacts
            .get(&id)
            .is_some_and(|p| p.creator_user_id == user_id && p.status == PactStatus::Pending);
        if !deletable {
            return Ok(false);
        }
        t.pacts.remove(&id);
        t.detach_pact(id);
        Ok(true)
    }

    async fn list_active_pacts_ending_before(&self, now: Timestamp) -> StoreResult<Vec<Pact>> {
        let t = self.tables.lock().await;
        let mut pacts: Vec<Pact> = t
            .pacts
            .values()
            .filter(|p| p.status == PactStatus::Active && p.end_date.is_some_and(|e| e < now))
            .cloned()
            .collect();
        pacts.sort_by_key(|p| p.end_date);
        Ok(pacts)
    }

    async fn list_pending_pacts_created_before(&self, cutoff: Timestamp) -> StoreResult<Vec<Pact>> {
        let t = self.tables.lock().await;
        let mut pacts: Vec<Pact> = t
            .pacts
            .values()
            .filter(|p| p.status == PactStatus::Pending && p.created_at < cutoff)
            .cloned()
            .collect();
        pacts.sort_by_key(|p| p.created_at);
        Ok(pacts)
    }

    // -- pact members --

    async fn add_pact_member(&self, input: &NewPactMember) -> StoreResult<PactMember> {
        let mut t = self.tables.lock().await;
        let now = Utc::now();
        let member = PactMember {
            id: t.next_id(),
            pact_id: input.pact_id,
            user_id: input.user_id,
            role: input.role,
            status: input.status,
            joined_at: input.joined_at,
            left_at: None,
            total_checkins: 0,
            completed_checkins: 0,
            current_streak: 0,
            longest_streak: 0,
            completion_rate: 0.0,
            created_at: now,
            updated_at: now,
        };
        t.pact_members.insert(member.id, member.clone());
        Ok(member)
    }

    async fn list_pact_members(&self, pact_id: DbId) -> StoreResult<Vec<PactMember>> {
        let t = self.tables.lock().await;
        let mut members: Vec<PactMember> = t
            .pact_members
            .values()
            .filter(|m| m.pact_id == pact_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| m.role.as_str());
        Ok(members)
    }

    async fn find_pact_member(
        &self,
        pact_id: DbId,
        user_id: UserId,
    ) -> StoreResult<Option<PactMember>> {
        let t = self.tables.lock().await;
        Ok(t
            .pact_members
            .values()
            .find(|m| m.pact_id == pact_id && m.user_id == user_id)
            .cloned())
    }

    async fn activate_pact_member(
        &self,
        pact_id: DbId,
        user_id: UserId,
        joined_at: Timestamp,
    ) -> StoreResult<Option<PactMember>> {
        let mut t = self.tables.lock().await;
        let member = t
            .pact_members
            .values_mut()
            .find(|m| m.pact_id == pact_id && m.user_id == user_id);
        Ok(member.map(|m| {
            m.status = MemberStatus::Active;
            m.joined_at = Some(joined_at);
            m.updated_at = Utc::now();
            m.clone()
        }))
    }

    async fn leave_pact(
        &self,
        pact_id: DbId,
        user_id: UserId,
        left_at: Timestamp,
    ) -> StoreResult<Option<PactMember>> {
        let mut t = self.tables.lock().await;
        let member = t
            .pact_members
            .values_mut()
            .find(|m| m.pact_id == pact_id && m.user_id == user_id);
        Ok(member.map(|m| {
            m.status = MemberStatus::Left;
            m.left_at = Some(left_at);
            m.updated_at = Utc::now();
            m.clone()
        }))
    }

    async fn record_member_checkin(
        &self,
        member_id: DbId,
        completed: bool,
        current_streak: Option<i32>,
    ) -> StoreResult<Option<PactMember>> {
        let mut t = self.tables.lock().await;
        let Some(member) = t.pact_members.get_mut(&member_id) else {
            return Ok(None);
        };
        member.total_checkins += 1;
        if completed {
            member.completed_checkins += 1;
        }
        member.completion_rate = member.tally().rate();
        if let Some(streak) = current_streak {
            member.current_streak = streak;
        }
        member.longest_streak = member.longest_streak.max(member.current_streak);
        member.updated_at = Utc::now();
        Ok(Some(member.clone()))
    }

    // -- streaks --

    async fn create_streak(&self, input: &NewStreak) -> StoreResult<Streak> {
        let mut t = self.tables.lock().await;
        let now = Utc::now();
        let streak = Streak {
            id: t.next_id(),
            user_id: input.user_id,
            habit_goal_id: input.habit_goal_id,
            pact_id: input.pact_id,
            current_streak: 0,
            current_streak_start_date: None,
            longest_streak: 0,
            longest_streak_start_date: None,
            longest_streak_end_date: None,
            last_completed_date: None,
            grace_period_days: input.grace_period_days,
            grace_days_used: 0,
            last_grace_date: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        t.streaks.insert(streak.id, streak.clone());
        Ok(streak)
    }

    async fn get_or_create_streak(&self, input: &NewStreak) -> StoreResult<Streak> {
        {
            let t = self.tables.lock().await;
            let existing = t.streaks.values().find(|s| {
                s.user_id == input.user_id
                    && s.habit_goal_id == input.habit_goal_id
                    && s.pact_id == input.pact_id
            });
            if let Some(streak) = existing {
                return Ok(streak.clone());
            }
        }
        self.create_streak(input).await
    }

    async fn find_streak(&self, id: DbId) -> StoreResult<Option<Streak>> {
        Ok(self.tables.lock().await.streaks.get(&id).cloned())
    }

    async fn find_streak_by_habit(
        &self,
        user_id: UserId,
        habit_goal_id: DbId,
    ) -> StoreResult<Option<Streak>> {
        let t = self.tables.lock().await;
        Ok(t
            .streaks
            .values()
            .filter(|s| s.user_id == user_id && s.habit_goal_id == habit_goal_id)
            .min_by_key(|s| (s.pact_id.is_some(), s.pact_id, s.id))
            .cloned())
    }

    async fn list_user_streaks(
        &self,
        user_id: UserId,
        is_active: Option<bool>,
    ) -> StoreResult<Vec<Streak>> {
        let t = self.tables.lock().await;
        let mut streaks: Vec<Streak> = t
            .streaks
            .values()
            .filter(|s| s.user_id == user_id)
            .filter(|s| is_active.is_none_or(|a| s.is_active == a))
            .cloned()
            .collect();
        streaks.sort_by(|a, b| b.current_streak.cmp(&a.current_streak).then(a.id.cmp(&b.id)));
        Ok(streaks)
    }

    async fn list_pact_streaks(&self, pact_id: DbId) -> StoreResult<Vec<Streak>> {
        let t = self.tables.lock().await;
        let mut streaks: Vec<Streak> = t
            .streaks
            .values()
            .filter(|s| s.pact_id == Some(pact_id))
            .cloned()
            .collect();
        streaks.sort_by(|a, b| b.current_streak.cmp(&a.current_streak).then(a.id.cmp(&b.id)));
        Ok(streaks)
    }

    async fn list_top_streaks(&self, limit: i64) -> StoreResult<Vec<Streak>> {
        let t = self.tables.lock().await;
        let mut streaks: Vec<Streak> = t
            .streaks
            .values()
            .filter(|s| s.is_active && s.current_streak > 0)
            .cloned()
            .collect();
        streaks.sort_by(|a, b| b.current_streak.cmp(&a.current_streak).then(a.id.cmp(&b.id)));
        Ok(page(streaks, Some(limit), 0))
    }

    async fn save_streak_progress(
        &self,
        id: DbId,
        state: &StreakState,
    ) -> StoreResult<Option<Streak>> {
        let mut t = self.tables.lock().await;
        Ok(t.streaks.get_mut(&id).map(|s| {
            s.apply(state);
            s.updated_at = Utc::now();
            s.clone()
        }))
    }

    async fn use_grace_day(&self, id: DbId, covered_date: Date) -> StoreResult<Option<Streak>> {
        let mut t = self.tables.lock().await;
        let Some(streak) = t.streaks.get_mut(&id) else {
            return Ok(None);
        };
        if streak.grace_days_used >= streak.grace_period_days {
            return Ok(None);
        }
        streak.grace_days_used += 1;
        streak.last_grace_date = Some(covered_date);
        streak.updated_at = Utc::now();
        Ok(Some(streak.clone()))
    }

    async fn deactivate_pact_streaks(&self, pact_id: DbId) -> StoreResult<u64> {
        let mut t = self.tables.lock().await;
        let mut count = 0;
        for streak in t
            .streaks
            .values_mut()
            .filter(|s| s.pact_id == Some(pact_id) && s.is_active)
        {
            streak.is_active = false;
            streak.updated_at = Utc::now();
            count += 1;
        }
        Ok(count)
    }

    // -- streak history --

    async fn append_streak_history(&self, input: &NewStreakHistory) -> StoreResult<StreakHistory> {
        let mut t = self.tables.lock().await;
        let entry = StreakHistory {
            id: t.next_id(),
            streak_id: input.streak_id,
            user_id: input.user_id,
            checkin_id: input.checkin_id,
            event_type: input.event_type,
            event_date: input.event_date,
            streak_before: input.streak_before,
            streak_after: input.streak_after,
            milestone_reached: input.milestone_reached,
            created_at: Utc::now(),
        };
        t.streak_history.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn list_streak_history(
        &self,
        streak_id: DbId,
        limit: Option<i64>,
    ) -> StoreResult<Vec<StreakHistory>> {
        let t = self.tables.lock().await;
        let mut entries: Vec<StreakHistory> = t
            .streak_history
            .values()
            .filter(|h| h.streak_id == streak_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.event_date.cmp(&a.event_date).then(b.id.cmp(&a.id)));
        Ok(page(entries, limit, 0))
    }

    async fn list_milestone_history(&self, user_id: UserId) -> StoreResult<Vec<StreakHistory>> {
        let t = self.tables.lock().await;
        let mut entries: Vec<StreakHistory> = t
            .streak_history
            .values()
            .filter(|h| {
                h.user_id == user_id
                    && h.event_type == StreakEventType::MilestoneReached
                    && h.milestone_reached.is_some()
            })
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.milestone_reached
                .cmp(&a.milestone_reached)
                .then(b.id.cmp(&a.id))
        });
        Ok(entries)
    }

    // -- checkins --

    async fn upsert_checkin(&self, input: &UpsertCheckin) -> StoreResult<HabitCheckin> {
        let mut t = self.tables.lock().await;
        let now = Utc::now();
        let existing = t.habit_checkins.values_mut().find(|c| {
            c.user_id == input.user_id
                && c.habit_goal_id == input.habit_goal_id
                && c.scheduled_date == input.scheduled_date
        });

        if let Some(checkin) = existing {
            checkin.completed_at = match input.status {
                CheckinStatus::Completed => checkin.completed_at.or(input.completed_at),
                _ => None,
            };
            if input.pact_id.is_some() {
                checkin.pact_id = input.pact_id;
            }
            checkin.status = input.status;
            checkin.notes = input.notes.clone();
            checkin.self_rating = input.self_rating;
            checkin.difficulty_rating = input.difficulty_rating;
            checkin.has_proof = input.has_proof;
            checkin.updated_at = now;
            return Ok(checkin.clone());
        }

        let checkin = HabitCheckin {
            id: t.next_id(),
            user_id: input.user_id,
            pact_id: input.pact_id,
            habit_goal_id: input.habit_goal_id,
            scheduled_date: input.scheduled_date,
            status: input.status,
            completed_at: input.completed_at,
            notes: input.notes.clone(),
            self_rating: input.self_rating,
            difficulty_rating: input.difficulty_rating,
            has_proof: input.has_proof,
            proof_verified: false,
            contributed_to_streak: false,
            created_at: now,
            updated_at: now,
        };
        t.habit_checkins.insert(checkin.id, checkin.clone());
        Ok(checkin)
    }

    async fn find_checkin(&self, id: DbId) -> StoreResult<Option<HabitCheckin>> {
        Ok(self.tables.lock().await.habit_checkins.get(&id).cloned())
    }

    async fn list_checkins_for_date(
        &self,
        user_id: UserId,
        date: Date,
        habit_goal_id: Option<DbId>,
    ) -> StoreResult<Vec<HabitCheckin>> {
        let t = self.tables.lock().await;
        Ok(t
            .habit_checkins
            .values()
            .filter(|c| c.user_id == user_id && c.scheduled_date == date)
            .filter(|c| habit_goal_id.is_none_or(|g| c.habit_goal_id == g))
            .cloned()
            .collect())
    }

    async fn list_checkins_in_range(
        &self,
        user_id: UserId,
        start: Date,
        end: Date,
        habit_goal_id: Option<DbId>,
    ) -> StoreResult<Vec<HabitCheckin>> {
        let t = self.tables.lock().await;
        let mut checkins: Vec<HabitCheckin> = t
            .habit_checkins
            .values()
            .filter(|c| c.user_id == user_id)
            .filter(|c| c.scheduled_date >= start && c.scheduled_date <= end)
            .filter(|c| habit_goal_id.is_none_or(|g| c.habit_goal_id == g))
            .cloned()
            .collect();
        checkins.sort_by(|a, b| {
            b.scheduled_date
                .cmp(&a.scheduled_date)
                .then(b.id.cmp(&a.id))
        });
        Ok(checkins)
    }

    async fn list_pact_checkins(
        &self,
        pact_id: DbId,
        limit: Option<i64>,
        offset: i64,
    ) -> StoreResult<Vec<HabitCheckin>> {
        let t = self.tables.lock().await;
        let mut checkins: Vec<HabitCheckin> = t
            .habit_checkins
            .values()
            .filter(|c| c.pact_id == Some(pact_id))
            .cloned()
            .collect();
        checkins.sort_by(|a, b| {
            b.scheduled_date
                .cmp(&a.scheduled_date)
                .then(b.id.cmp(&a.id))
        });
        Ok(page(checkins, limit, offset))
    }

    async fn update_checkin(
        &self,
        id: DbId,
        changes: &CheckinChanges,
    ) -> StoreResult<Option<HabitCheckin>> {
        let mut t = self.tables.lock().await;
        let Some(checkin) = t.habit_checkins.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(status) = changes.status {
            checkin.status = status;
        }
        if changes.completed_at.is_some() {
            checkin.completed_at = changes.completed_at;
        }
        if let Some(notes) = &changes.notes {
            checkin.notes = Some(notes.clone());
        }
        if changes.self_rating.is_some() {
            checkin.self_rating = changes.self_rating;
        }
        if changes.difficulty_rating.is_some() {
            checkin.difficulty_rating = changes.difficulty_rating;
        }
        if let Some(has_proof) = changes.has_proof {
            checkin.has_proof = has_proof;
        }
        if let Some(contributed) = changes.contributed_to_streak {
            checkin.contributed_to_streak = contributed;
        }
        checkin.updated_at = Utc::now();
        Ok(Some(checkin.clone()))
    }

    async fn delete_checkin(&self, id: DbId, user_id: UserId) -> StoreResult<bool> {
        let mut t = self.tables.lock().await;
        let owned = t
            .habit_checkins
            .get(&id)
            .is_some_and(|c| c.user_id == user_id);
        if owned {
            t.habit_checkins.remove(&id);
        }
        Ok(owned)
    }

    async fn pact_checkin_tally(&self, pact_id: DbId, user_id: UserId) -> StoreResult<CheckinTally> {
        let t = self.tables.lock().await;
        let mut tally = CheckinTally::default();
        for checkin in t
            .habit_checkins
            .values()
            .filter(|c| c.pact_id == Some(pact_id) && c.user_id == user_id)
        {
            tally.total += 1;
            if checkin.status == CheckinStatus::Completed {
                tally.completed += 1;
            }
        }
        Ok(tally)
    }
}
