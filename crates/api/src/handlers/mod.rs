pub mod habit_checkins;
pub mod habit_goals;
pub mod pacts;
pub mod streaks;
