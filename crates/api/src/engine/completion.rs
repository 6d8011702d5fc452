//! Streak bookkeeping after a checkin is recorded as completed.
//!
//! Runs after the checkin upsert has already succeeded. The caller decides
//! what a failure here means for the response; nothing in this module
//! touches the checkin's own fields other than `contributed_to_streak`.

use habits_core::streaks::{advance_streak, check_milestone_reached, StreakAdvance, StreakEventType};
use habits_core::pacts::partner_user_id_for;
use habits_db::models::habit_checkin::{CheckinChanges, HabitCheckin};
use habits_db::models::habit_goal::HabitGoal;
use habits_db::models::pact::Pact;
use habits_db::models::streak::{NewStreak, NewStreakHistory, Streak};
use habits_db::{HabitStore, StoreResult};
use habits_events::NotificationDispatcher;

use crate::middleware::request_user::RequestUser;
use crate::notifications;

/// What a completion did to the user's streak.
#[derive(Debug)]
pub struct CompletionOutcome {
    pub checkin: HabitCheckin,
    pub streak: Streak,
    pub milestone: Option<i32>,
}

/// Everything [`record_completion`] needs besides the checkin itself.
pub struct CompletionContext<'a> {
    pub store: &'a dyn HabitStore,
    pub notifier: &'a NotificationDispatcher,
    pub user: &'a RequestUser,
    pub goal: &'a HabitGoal,
    pub pact: Option<&'a Pact>,
    /// Grace allowance for a streak created by this completion.
    pub grace_period_days: i32,
}

/// Advance the streak for `checkin`, write history, update pact member
/// stats and queue notifications.
///
/// A completion for a day the streak already counted changes nothing and
/// returns the streak as stored.
pub async fn record_completion(
    ctx: &CompletionContext<'_>,
    checkin: HabitCheckin,
) -> StoreResult<CompletionOutcome> {
    let store = ctx.store;
    let streak = store
        .get_or_create_streak(&NewStreak {
            user_id: ctx.user.user_id,
            habit_goal_id: checkin.habit_goal_id,
            pact_id: ctx.pact.map(|p| p.id),
            grace_period_days: ctx.grace_period_days,
        })
        .await?;

    let advance = advance_streak(&streak.state(), &ctx.goal.schedule(), checkin.scheduled_date);
    let (before, next) = match advance {
        StreakAdvance::AlreadyCounted => {
            tracing::debug!(
                streak_id = streak.id,
                checkin_id = checkin.id,
                "Completion already counted"
            );
            return Ok(CompletionOutcome {
                checkin,
                streak,
                milestone: None,
            });
        }
        StreakAdvance::Restarted { broken, next } => {
            append_history(store, &streak, &checkin, StreakEventType::Missed, broken, 0, None)
                .await?;
            tracing::info!(streak_id = streak.id, broken, "Streak reset after a miss");
            (0, next)
        }
        StreakAdvance::Continued { before, next } => (before, next),
    };

    let after = next.current_streak;
    let streak = store
        .save_streak_progress(streak.id, &next)
        .await?
        .unwrap_or_else(|| {
            let mut stale = streak.clone();
            stale.apply(&next);
            stale
        });

    append_history(
        store,
        &streak,
        &checkin,
        StreakEventType::Completed,
        before,
        after,
        None,
    )
    .await?;

    let milestone = check_milestone_reached(after);
    if let Some(milestone) = milestone {
        append_history(
            store,
            &streak,
            &checkin,
            StreakEventType::MilestoneReached,
            after,
            after,
            Some(milestone),
        )
        .await?;
        tracing::info!(
            user_id = %ctx.user.user_id,
            streak_id = streak.id,
            milestone,
            "Streak milestone reached"
        );
        ctx.notifier.enqueue(notifications::streak_milestone(
            ctx.user.user_id,
            ctx.user.email.clone(),
            streak.id,
            streak.habit_goal_id,
            milestone,
            &ctx.user.locale,
        ));
    }

    if let Some(pact) = ctx.pact {
        record_pact_progress(ctx, pact, &checkin, after).await?;
    }

    let checkin = store
        .update_checkin(
            checkin.id,
            &CheckinChanges {
                contributed_to_streak: Some(true),
                ..Default::default()
            },
        )
        .await?
        .unwrap_or(checkin);

    Ok(CompletionOutcome {
        checkin,
        streak,
        milestone,
    })
}

async fn record_pact_progress(
    ctx: &CompletionContext<'_>,
    pact: &Pact,
    checkin: &HabitCheckin,
    current_streak: i32,
) -> StoreResult<()> {
    let user_id = ctx.user.user_id;
    match ctx.store.find_pact_member(pact.id, user_id).await? {
        Some(member) => {
            ctx.store
                .record_member_checkin(member.id, true, Some(current_streak))
                .await?;
        }
        None => {
            tracing::warn!(pact_id = pact.id, user_id = %user_id, "No pact member row for checkin");
        }
    }

    if let Some(partner) = partner_user_id_for(user_id, pact.creator_user_id, pact.partner_user_id) {
        ctx.notifier.enqueue(notifications::partner_checked_in(
            checkin,
            pact.id,
            partner,
            current_streak,
            &ctx.user.locale,
        ));
    }
    Ok(())
}

async fn append_history(
    store: &dyn HabitStore,
    streak: &Streak,
    checkin: &HabitCheckin,
    event_type: StreakEventType,
    streak_before: i32,
    streak_after: i32,
    milestone_reached: Option<i32>,
) -> StoreResult<()> {
    store
        .append_streak_history(&NewStreakHistory {
            streak_id: streak.id,
            user_id: streak.user_id,
            checkin_id: Some(checkin.id),
            event_type,
            event_date: checkin.scheduled_date,
            streak_before,
            streak_after,
            milestone_reached,
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, Utc};
    use habits_core::habits::CheckinStatus;
    use habits_db::models::habit_checkin::UpsertCheckin;
    use habits_db::models::habit_goal::NewHabitGoal;
    use habits_db::MemoryStore;
    use habits_events::DeliveryPolicy;
    use uuid::Uuid;

    use super::*;

    struct Fixture {
        store: MemoryStore,
        notifier: NotificationDispatcher,
        _worker: habits_events::DispatchWorker,
        user: RequestUser,
        goal: HabitGoal,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let user = RequestUser {
            user_id: Uuid::new_v4(),
            locale: "en-us".into(),
            email: None,
        };
        let goal = store
            .create_habit_goal(&NewHabitGoal {
                name: "Read".into(),
                frequency_count: 1,
                created_by_user_id: Some(user.user_id),
                ..Default::default()
            })
            .await
            .unwrap();
        let (notifier, worker) =
            NotificationDispatcher::new(16, Vec::new(), DeliveryPolicy::default());
        Fixture {
            store,
            notifier,
            _worker: worker,
            user,
            goal,
        }
    }

    async fn complete(fx: &Fixture, date: NaiveDate) -> CompletionOutcome {
        let checkin = fx
            .store
            .upsert_checkin(&UpsertCheckin {
                user_id: fx.user.user_id,
                habit_goal_id: fx.goal.id,
                pact_id: None,
                scheduled_date: date,
                status: CheckinStatus::Completed,
                completed_at: Some(Utc::now()),
                notes: None,
                self_rating: None,
                difficulty_rating: None,
                has_proof: false,
            })
            .await
            .unwrap();
        let ctx = CompletionContext {
            store: &fx.store,
            notifier: &fx.notifier,
            user: &fx.user,
            goal: &fx.goal,
            pact: None,
            grace_period_days: 0,
        };
        record_completion(&ctx, checkin).await.unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[tokio::test]
    async fn first_completion_starts_streak() {
        let fx = fixture().await;
        let outcome = complete(&fx, day(1)).await;

        assert_eq!(outcome.streak.current_streak, 1);
        assert!(outcome.checkin.contributed_to_streak);

        let history = fx.store.list_streak_history(outcome.streak.id, None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event_type, StreakEventType::Completed);
        assert_eq!((history[0].streak_before, history[0].streak_after), (0, 1));
    }

    #[tokio::test]
    async fn same_day_is_counted_once() {
        let fx = fixture().await;
        complete(&fx, day(1)).await;
        let again = complete(&fx, day(1)).await;

        assert_eq!(again.streak.current_streak, 1);
        let history = fx.store.list_streak_history(again.streak.id, None).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn third_day_hits_milestone() {
        let fx = fixture().await;
        complete(&fx, day(1)).await;
        complete(&fx, day(2)).await;
        let third = complete(&fx, day(3)).await;

        assert_eq!(third.milestone, Some(3));
        let milestones = fx.store.list_milestone_history(fx.user.user_id).await.unwrap();
        assert_eq!(milestones.len(), 1);
        assert_eq!(milestones[0].milestone_reached, Some(3));
    }

    #[tokio::test]
    async fn gap_records_miss_then_restart() {
        let fx = fixture().await;
        complete(&fx, day(1)).await;
        complete(&fx, day(2)).await;
        let later = complete(&fx, day(2) + Duration::days(3)).await;

        assert_eq!(later.streak.current_streak, 1);
        assert_eq!(later.streak.longest_streak, 2);

        let history = fx.store.list_streak_history(later.streak.id, None).await.unwrap();
        let missed = history
            .iter()
            .find(|h| h.event_type == StreakEventType::Missed)
            .unwrap();
        assert_eq!((missed.streak_before, missed.streak_after), (2, 0));
    }
}
