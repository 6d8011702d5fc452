//! Row models and the DTOs used to create or change them.
//!
//! Rows serialize in camelCase, matching the JSON the mobile clients send.

pub mod habit_checkin;
pub mod habit_goal;
pub mod pact;
pub mod pact_member;
pub mod streak;
