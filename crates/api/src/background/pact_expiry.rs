//! Periodic pact expiration sweep.
//!
//! Active pacts past their end date are scored and closed: `completed` with
//! completion rates and a winner when anyone checked in, `expired`
//! otherwise. Pending invitations older than the configured window expire.
//! Participants are notified either way.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use habits_core::pacts::{
    calculate_pact_completion_stats, has_invitation_expired, should_expire_pact, CheckinTally,
    EndReason, PactStatus,
};
use habits_core::types::Timestamp;
use habits_db::models::pact::{Pact, PactOutcome};
use habits_db::{HabitStore, StoreResult};
use habits_events::NotificationDispatcher;
use tokio_util::sync::CancellationToken;

use crate::middleware::request_user::DEFAULT_LOCALE;
use crate::notifications;

/// What one sweep changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub completed: usize,
    pub expired: usize,
    pub invitations_expired: usize,
}

/// Run the sweep every `interval` until `cancel` is triggered.
pub async fn run(
    store: Arc<dyn HabitStore>,
    notifier: NotificationDispatcher,
    interval: Duration,
    invitation_expiry_days: i64,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        invitation_expiry_days,
        "Pact expiry job started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Pact expiry job stopping");
                break;
            }
            _ = ticker.tick() => {
                match sweep_once(store.as_ref(), &notifier, invitation_expiry_days, Utc::now()).await {
                    Ok(report) if report == SweepReport::default() => {
                        tracing::debug!("Pact expiry: nothing to do");
                    }
                    Ok(report) => {
                        tracing::info!(
                            completed = report.completed,
                            expired = report.expired,
                            invitations_expired = report.invitations_expired,
                            "Pact expiry: pacts closed"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Pact expiry: sweep failed");
                    }
                }
            }
        }
    }
}

/// One pass over overdue active pacts and stale invitations.
///
/// Listing failures abort the pass; a failure on a single pact is logged
/// and the pass moves on.
pub async fn sweep_once(
    store: &dyn HabitStore,
    notifier: &NotificationDispatcher,
    invitation_expiry_days: i64,
    now: Timestamp,
) -> StoreResult<SweepReport> {
    let mut report = SweepReport::default();

    for pact in store.list_active_pacts_ending_before(now).await? {
        if !should_expire_pact(pact.status, pact.end_date, now) {
            continue;
        }
        match close_active_pact(store, &pact).await {
            Ok(Some(closed)) => {
                if closed.status == PactStatus::Completed {
                    report.completed += 1;
                } else {
                    report.expired += 1;
                }
                for participant in [Some(closed.creator_user_id), closed.partner_user_id]
                    .into_iter()
                    .flatten()
                {
                    notifier.enqueue(notifications::pact_concluded(
                        &closed,
                        participant,
                        DEFAULT_LOCALE,
                    ));
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(pact_id = pact.id, error = %e, "Pact expiry: failed to close pact");
            }
        }
    }

    let cutoff = now - chrono::Duration::days(invitation_expiry_days);
    for pact in store.list_pending_pacts_created_before(cutoff).await? {
        if !has_invitation_expired(pact.created_at, invitation_expiry_days, now) {
            continue;
        }
        let outcome = PactOutcome::ended(PactStatus::Expired, EndReason::Expired);
        match store.end_pact(pact.id, &outcome).await {
            Ok(Some(closed)) => {
                report.invitations_expired += 1;
                notifier.enqueue(notifications::pact_concluded(
                    &closed,
                    closed.creator_user_id,
                    DEFAULT_LOCALE,
                ));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(pact_id = pact.id, error = %e, "Pact expiry: failed to expire invitation");
            }
        }
    }

    Ok(report)
}

/// Score and close an overdue active pact, then deactivate its streaks.
async fn close_active_pact(store: &dyn HabitStore, pact: &Pact) -> StoreResult<Option<Pact>> {
    let creator = store.pact_checkin_tally(pact.id, pact.creator_user_id).await?;
    let partner = match pact.partner_user_id {
        Some(partner_id) => Some((partner_id, store.pact_checkin_tally(pact.id, partner_id).await?)),
        None => None,
    };

    let outcome = score(pact, creator, partner);
    let closed = store.end_pact(pact.id, &outcome).await?;
    if closed.is_some() {
        store.deactivate_pact_streaks(pact.id).await?;
        tracing::info!(
            pact_id = pact.id,
            status = %outcome.status,
            winner_id = ?outcome.winner_id,
            "Pact closed by expiry sweep"
        );
    }
    Ok(closed)
}

fn score(
    pact: &Pact,
    creator: CheckinTally,
    partner: Option<(habits_core::types::UserId, CheckinTally)>,
) -> PactOutcome {
    let partner_total = partner.map_or(0, |(_, tally)| tally.total);
    if creator.total == 0 && partner_total == 0 {
        return PactOutcome::ended(PactStatus::Expired, EndReason::Expired);
    }

    match partner {
        Some((partner_id, partner_tally)) => {
            let stats = calculate_pact_completion_stats(
                creator,
                partner_tally,
                pact.creator_user_id,
                partner_id,
            );
            PactOutcome {
                status: PactStatus::Completed,
                end_reason: EndReason::Completed,
                winner_id: stats.winner_id,
                creator_completion_rate: Some(stats.creator_completion_rate),
                partner_completion_rate: Some(stats.partner_completion_rate),
            }
        }
        None => PactOutcome {
            status: PactStatus::Completed,
            end_reason: EndReason::Completed,
            winner_id: None,
            creator_completion_rate: Some(creator.rate()),
            partner_completion_rate: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, NaiveDate};
    use habits_core::habits::CheckinStatus;
    use habits_core::pacts::{ConsequenceType, PactType};
    use habits_core::types::UserId;
    use habits_db::models::habit_checkin::UpsertCheckin;
    use habits_db::models::pact::NewPact;
    use habits_db::models::streak::NewStreak;
    use habits_db::MemoryStore;
    use habits_events::{DeliveryPolicy, DispatchWorker};
    use uuid::Uuid;

    use super::*;

    fn dispatcher() -> (NotificationDispatcher, DispatchWorker) {
        NotificationDispatcher::new(32, Vec::new(), DeliveryPolicy::default())
    }

    async fn overdue_pact(store: &MemoryStore, partner: Option<UserId>) -> Pact {
        let now = Utc::now();
        store
            .create_pact(&NewPact {
                creator_user_id: Uuid::new_v4(),
                partner_user_id: partner,
                habit_goal_id: 1,
                pact_type: PactType::Challenge,
                status: PactStatus::Active,
                duration_days: 7,
                start_date: Some(now - ChronoDuration::days(8)),
                end_date: Some(now - ChronoDuration::days(1)),
                consequence_type: ConsequenceType::None,
                consequence_details: None,
            })
            .await
            .unwrap()
    }

    async fn checkin(store: &MemoryStore, pact: &Pact, user: UserId, day: u32, status: CheckinStatus) {
        store
            .upsert_checkin(&UpsertCheckin {
                user_id: user,
                habit_goal_id: pact.habit_goal_id,
                pact_id: Some(pact.id),
                scheduled_date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
                status,
                completed_at: None,
                notes: None,
                self_rating: None,
                difficulty_rating: None,
                has_proof: false,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn overdue_pact_with_checkins_is_completed_with_winner() {
        let store = MemoryStore::new();
        let (notifier, _worker) = dispatcher();
        let partner = Uuid::new_v4();
        let pact = overdue_pact(&store, Some(partner)).await;
        store
            .create_streak(&NewStreak {
                user_id: partner,
                habit_goal_id: pact.habit_goal_id,
                pact_id: Some(pact.id),
                grace_period_days: 0,
            })
            .await
            .unwrap();

        checkin(&store, &pact, pact.creator_user_id, 1, CheckinStatus::Completed).await;
        checkin(&store, &pact, pact.creator_user_id, 2, CheckinStatus::Skipped).await;
        checkin(&store, &pact, partner, 1, CheckinStatus::Completed).await;

        let report = sweep_once(&store, &notifier, 7, Utc::now()).await.unwrap();
        assert_eq!(report.completed, 1);

        let closed = store.find_pact(pact.id).await.unwrap().unwrap();
        assert_eq!(closed.status, PactStatus::Completed);
        assert_eq!(closed.end_reason(), Some(EndReason::Completed));
        assert_eq!(closed.winner_id, Some(partner));
        assert_eq!(closed.creator_completion_rate, Some(50.0));
        assert_eq!(closed.partner_completion_rate, Some(100.0));

        let streaks = store.list_pact_streaks(pact.id).await.unwrap();
        assert!(streaks.iter().all(|s| !s.is_active));
    }

    #[tokio::test]
    async fn overdue_pact_without_checkins_expires() {
        let store = MemoryStore::new();
        let (notifier, _worker) = dispatcher();
        let pact = overdue_pact(&store, None).await;

        let report = sweep_once(&store, &notifier, 7, Utc::now()).await.unwrap();
        assert_eq!(report.expired, 1);

        let closed = store.find_pact(pact.id).await.unwrap().unwrap();
        assert_eq!(closed.status, PactStatus::Expired);
        assert_eq!(closed.end_reason(), Some(EndReason::Expired));
    }

    #[tokio::test]
    async fn stale_invitation_expires() {
        let store = MemoryStore::new();
        let (notifier, _worker) = dispatcher();
        let pending = store
            .create_pact(&NewPact {
                creator_user_id: Uuid::new_v4(),
                partner_user_id: Some(Uuid::new_v4()),
                habit_goal_id: 1,
                pact_type: PactType::Accountability,
                status: PactStatus::Pending,
                duration_days: 30,
                start_date: None,
                end_date: None,
                consequence_type: ConsequenceType::None,
                consequence_details: None,
            })
            .await
            .unwrap();

        let soon = sweep_once(&store, &notifier, 7, Utc::now() + ChronoDuration::days(3))
            .await
            .unwrap();
        assert_eq!(soon.invitations_expired, 0);

        let later = sweep_once(&store, &notifier, 7, Utc::now() + ChronoDuration::days(9))
            .await
            .unwrap();
        assert_eq!(later.invitations_expired, 1);
        let closed = store.find_pact(pending.id).await.unwrap().unwrap();
        assert_eq!(closed.status, PactStatus::Expired);
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let store: Arc<dyn HabitStore> = Arc::new(MemoryStore::new());
        let (notifier, _worker) = dispatcher();
        let cancel = CancellationToken::new();
        cancel.cancel();
        run(store, notifier, Duration::from_secs(3600), 7, cancel).await;
    }
}
