//! Ownership and participation checks shared by every pact, streak and
//! checkin operation. Each returns [`CoreError::Forbidden`] on failure so
//! callers can `?` them before touching the store.

use crate::error::CoreError;
use crate::pacts::is_user_in_pact;
use crate::types::UserId;

/// The requester must be the pact's creator or its partner.
pub fn ensure_pact_participant(
    user_id: UserId,
    creator_user_id: UserId,
    partner_user_id: Option<UserId>,
) -> Result<(), CoreError> {
    if is_user_in_pact(user_id, creator_user_id, partner_user_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "You are not a participant in this pact".to_string(),
        ))
    }
}

/// The requester must be the partner the pact invited.
pub fn ensure_invited_partner(
    user_id: UserId,
    partner_user_id: Option<UserId>,
) -> Result<(), CoreError> {
    if partner_user_id == Some(user_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "You are not the invited partner for this pact".to_string(),
        ))
    }
}

/// What the requester is trying to do with a resource they must own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Update,
    Modify,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Update => "update",
            Self::Modify => "modify",
        }
    }
}

/// The requester must own the resource (`resource` is a lowercase noun
/// such as `"checkin"` or `"streak history"`).
pub fn ensure_owner(
    user_id: UserId,
    owner_id: UserId,
    action: Action,
    resource: &str,
) -> Result<(), CoreError> {
    if user_id == owner_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Not authorized to {} this {resource}",
            action.verb()
        )))
    }
}
