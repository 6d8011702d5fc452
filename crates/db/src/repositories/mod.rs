//! Zero-sized repositories, one per table. Every method takes the pool
//! explicitly and issues a single statement.

pub mod habit_checkin_repo;
pub mod habit_goal_repo;
pub mod pact_member_repo;
pub mod pact_repo;
pub mod streak_repo;

pub use habit_checkin_repo::HabitCheckinRepo;
pub use habit_goal_repo::HabitGoalRepo;
pub use pact_member_repo::PactMemberRepo;
pub use pact_repo::PactRepo;
pub use streak_repo::StreakRepo;
