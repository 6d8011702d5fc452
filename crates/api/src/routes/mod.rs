pub mod habit_checkins;
pub mod habit_goals;
pub mod health;
pub mod pacts;
pub mod streaks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /habit-checkins                      create (upsert)
/// /habit-checkins/today                today's checkins
/// /habit-checkins/range                checkins between two dates
/// /habit-checkins/pact/{pact_id}       checkins logged against a pact
/// /habit-checkins/{id}                 get, update, delete
/// /habit-checkins/{id}/skip            mark skipped (PUT)
///
/// /pacts                               list, create
/// /pacts/active                        active pacts
/// /pacts/invites                       pending invitations
/// /pacts/{id}                          detail, delete
/// /pacts/{id}/accept                   accept invitation (PUT)
/// /pacts/{id}/decline                  decline invitation (PUT)
/// /pacts/{id}/abandon                  leave an active pact (PUT)
///
/// /streaks                             list
/// /streaks/active                      active streaks
/// /streaks/milestones                  milestone history
/// /streaks/top                         leaderboard
/// /streaks/habit/{habit_goal_id}       streak for a habit
/// /streaks/pact/{pact_id}              streaks tied to a pact
/// /streaks/{id}                        get
/// /streaks/{id}/history                history
/// /streaks/{id}/grace                  spend a grace day (PUT)
///
/// /habit-goals                         list own, create
/// /habit-goals/templates               templates
/// /habit-goals/public                  public goals
/// /habit-goals/search                  name search
/// /habit-goals/{id}                    get, update, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/habit-checkins", habit_checkins::router())
        .nest("/pacts", pacts::router())
        .nest("/streaks", streaks::router())
        .nest("/habit-goals", habit_goals::router())
}
