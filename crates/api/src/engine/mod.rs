//! Orchestration shared by several handlers: streak bookkeeping after a
//! completed checkin and the read-side streak projections.

pub mod completion;
pub mod streak_view;
