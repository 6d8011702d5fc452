//! Request extractors.
//!
//! - [`request_user::RequestUser`] -- the caller identity forwarded by the gateway.

pub mod request_user;
