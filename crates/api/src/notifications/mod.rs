//! Builders for the notifications request handlers and the expiration
//! sweep hand to the [`NotificationDispatcher`](habits_events::NotificationDispatcher).
//!
//! The service has no user directory, so messages refer to the other
//! participant as "Your partner".

use habits_core::pacts::{activity_display, format_pact_duration, PactActivityKind, PactStatus};
use habits_core::streaks::{format_streak_display, streak_emoji};
use habits_core::types::{DbId, UserId};
use habits_db::models::habit_checkin::HabitCheckin;
use habits_db::models::pact::Pact;
use habits_events::{Notification, NotificationKind};
use serde_json::json;

const PARTNER: &str = "Your partner";

/// Sent to the invited partner when a pact is created.
pub fn pact_invitation(pact: &Pact, partner_user_id: UserId, locale: &str) -> Notification {
    let duration = format_pact_duration(pact.duration_days);
    Notification::new(NotificationKind::PactInvitation, partner_user_id, locale)
        .with_actor(pact.creator_user_id)
        .with_text(
            "New pact invitation",
            format!("You've been invited to a {duration} {} pact", pact.pact_type),
        )
        .with_payload(pact_payload(pact))
}

/// Sent to the creator when the partner accepts.
pub fn pact_accepted(pact: &Pact, locale: &str) -> Notification {
    let joined = activity_display(PactActivityKind::PartnerJoined, PARTNER);
    let mut n = Notification::new(NotificationKind::PactAccepted, pact.creator_user_id, locale)
        .with_text(
            format!("Pact accepted {}", joined.emoji),
            joined.message,
        )
        .with_payload(pact_payload(pact));
    if let Some(partner) = pact.partner_user_id {
        n = n.with_actor(partner);
    }
    n
}

/// Sent to the creator when the partner declines.
pub fn pact_declined(pact: &Pact, locale: &str) -> Notification {
    let mut n = Notification::new(NotificationKind::PactDeclined, pact.creator_user_id, locale)
        .with_text("Pact declined", format!("{PARTNER} declined your pact invitation"))
        .with_payload(pact_payload(pact));
    if let Some(partner) = pact.partner_user_id {
        n = n.with_actor(partner);
    }
    n
}

/// Sent to the participant left behind when the other one abandons.
pub fn pact_abandoned(pact: &Pact, actor: UserId, recipient: UserId, locale: &str) -> Notification {
    Notification::new(NotificationKind::PactAbandoned, recipient, locale)
        .with_actor(actor)
        .with_text("Pact abandoned", format!("{PARTNER} left your pact"))
        .with_payload(pact_payload(pact))
}

/// Sent to the other participant after a completed pact checkin.
pub fn partner_checked_in(
    checkin: &HabitCheckin,
    pact_id: DbId,
    recipient: UserId,
    current_streak: i32,
    locale: &str,
) -> Notification {
    let activity = activity_display(PactActivityKind::CheckinCompleted, PARTNER);
    Notification::new(NotificationKind::PartnerCheckedIn, recipient, locale)
        .with_actor(checkin.user_id)
        .with_text(format!("Partner checked in {}", activity.emoji), activity.message)
        .with_payload(json!({
            "pactId": pact_id,
            "checkinId": checkin.id,
            "habitGoalId": checkin.habit_goal_id,
            "scheduledDate": checkin.scheduled_date,
            "currentStreak": current_streak,
        }))
}

/// Sent to the user whose streak just hit a milestone. Carries the email
/// address when the gateway supplied one.
pub fn streak_milestone(
    user_id: UserId,
    email: Option<String>,
    streak_id: DbId,
    habit_goal_id: DbId,
    milestone: i32,
    locale: &str,
) -> Notification {
    Notification::new(NotificationKind::StreakMilestone, user_id, locale)
        .with_email(email)
        .with_text(
            format!("{} streak {}", format_streak_display(milestone), streak_emoji(milestone)),
            format!("You reached a {milestone}-day streak. Keep it going!"),
        )
        .with_payload(json!({
            "streakId": streak_id,
            "habitGoalId": habit_goal_id,
            "milestone": milestone,
        }))
}

/// Sent to a participant when the sweep ends a pact.
pub fn pact_concluded(pact: &Pact, recipient: UserId, locale: &str) -> Notification {
    let (kind, title, body) = match pact.status {
        PactStatus::Completed => {
            let done = activity_display(PactActivityKind::PactCompleted, PARTNER);
            let body = match pact.winner_id {
                Some(winner) if winner == recipient => "You finished with the higher completion rate!",
                Some(_) => "Your partner finished with the higher completion rate",
                None => "It's a draw",
            };
            (
                NotificationKind::PactCompleted,
                format!("{} {}", done.message, done.emoji),
                body.to_string(),
            )
        }
        _ => (
            NotificationKind::PactExpired,
            "Pact expired".to_string(),
            format!("Your {} pact expired", format_pact_duration(pact.duration_days)),
        ),
    };

    Notification::new(kind, recipient, locale)
        .with_text(title, body)
        .with_payload(json!({
            "pactId": pact.id,
            "status": pact.status,
            "winnerId": pact.winner_id,
            "creatorCompletionRate": pact.creator_completion_rate,
            "partnerCompletionRate": pact.partner_completion_rate,
        }))
}

fn pact_payload(pact: &Pact) -> serde_json::Value {
    json!({
        "pactId": pact.id,
        "habitGoalId": pact.habit_goal_id,
        "pactType": pact.pact_type,
        "durationDays": pact.duration_days,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use habits_core::pacts::{ConsequenceType, PactType};
    use uuid::Uuid;

    use super::*;

    fn pact(status: PactStatus, winner_id: Option<UserId>) -> Pact {
        let now = Utc::now();
        Pact {
            id: 9,
            creator_user_id: Uuid::new_v4(),
            partner_user_id: Some(Uuid::new_v4()),
            habit_goal_id: 3,
            pact_type: PactType::Accountability,
            status,
            duration_days: 14,
            start_date: Some(now),
            end_date: Some(now),
            consequence_type: ConsequenceType::None,
            consequence_details: None,
            end_reason_raw: None,
            winner_id,
            creator_completion_rate: None,
            partner_completion_rate: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn invitation_targets_partner() {
        let p = pact(PactStatus::Pending, None);
        let partner = p.partner_user_id.unwrap();
        let n = pact_invitation(&p, partner, "en-us");

        assert_eq!(n.kind, NotificationKind::PactInvitation);
        assert_eq!(n.recipient, partner);
        assert_eq!(n.actor, Some(p.creator_user_id));
        assert_eq!(n.body, "You've been invited to a 2 weeks accountability pact");
        assert_eq!(n.payload["pactId"], 9);
    }

    #[test]
    fn accepted_goes_to_creator() {
        let p = pact(PactStatus::Active, None);
        let n = pact_accepted(&p, "en-us");
        assert_eq!(n.recipient, p.creator_user_id);
        assert_eq!(n.body, "Your partner joined the pact!");
    }

    #[test]
    fn concluded_names_the_winner() {
        let p = pact(PactStatus::Completed, None);
        let winner = p.creator_user_id;
        let p = Pact {
            winner_id: Some(winner),
            ..p
        };

        let to_winner = pact_concluded(&p, winner, "en-us");
        assert_eq!(to_winner.kind, NotificationKind::PactCompleted);
        assert!(to_winner.body.starts_with("You finished"));

        let expired = pact_concluded(&pact(PactStatus::Expired, None), winner, "en-us");
        assert_eq!(expired.kind, NotificationKind::PactExpired);
    }

    #[test]
    fn milestone_carries_email() {
        let n = streak_milestone(Uuid::new_v4(), Some("a@b.test".into()), 1, 2, 7, "en-us");
        assert_eq!(n.recipient_email.as_deref(), Some("a@b.test"));
        assert_eq!(n.title, "7 days streak ✨");
        assert_eq!(n.payload["milestone"], 7);
    }
}
