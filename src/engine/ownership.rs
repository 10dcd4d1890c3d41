// Ownership policy: only the creator of an event may mutate it

use crate::core::errors::AppError;
use crate::core::models::{Event, Principal, UserId};

/// True iff `principal_id` owns `event`. Pure, no I/O.
pub fn can_mutate(principal_id: UserId, event: &Event) -> bool {
    event.user_id == principal_id
}

/// Reject with an authorization error unless the principal owns the event
///
/// Must be called before any mutation of the event or its registrations.
pub fn ensure_can_mutate(principal: &Principal, event: &Event, action: &str) -> Result<(), AppError> {
    if can_mutate(principal.user_id, event) {
        Ok(())
    } else {
        Err(AppError::Authorization(format!(
            "not authorized to {} the event",
            action
        )))
    }
}
