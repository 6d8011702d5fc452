//! Domain core for the habit streak and pact accountability service.
//!
//! Pure types and functions only: no I/O, no clocks other than the
//! convenience wrappers that read the server's local time.

#[macro_use]
mod macros;

pub mod access;
pub mod error;
pub mod habits;
pub mod pacts;
pub mod streaks;
pub mod types;
