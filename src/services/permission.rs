use crate::database::models::ROLE_ADMIN;
use crate::error::ApiError;

use super::session::AuthenticatedUser;

/// Admin role holders pass every ownership check
pub fn is_admin(actor: &AuthenticatedUser) -> bool {
    actor.roles.iter().any(|role| role == ROLE_ADMIN)
}

/// Owner-or-admin rule shared by collection and item writes
pub fn can_act(actor: &AuthenticatedUser, resource_owner_id: i32) -> bool {
    actor.user.user_id == resource_owner_id || is_admin(actor)
}

pub fn ensure_can_act(
    actor: &AuthenticatedUser,
    resource_owner_id: i32,
    denied_message: &str,
) -> Result<(), ApiError> {
    if can_act(actor, resource_owner_id) {
        Ok(())
    } else {
        tracing::warn!(
            "User {} denied on resource owned by {}: {}",
            actor.user.user_id,
            resource_owner_id,
            denied_message
        );
        Err(ApiError::forbidden(denied_message))
    }
}

pub fn ensure_admin(actor: &AuthenticatedUser) -> Result<(), ApiError> {
    if is_admin(actor) {
        Ok(())
    } else {
        tracing::warn!("User {} denied admin access", actor.user.user_id);
        Err(ApiError::forbidden("Access is denied. Administrator rights required."))
    }
}

/// Hidden items are only visible to whoever may act on their collection
pub fn can_view_hidden(actor: Option<&AuthenticatedUser>, collection_owner_id: i32) -> bool {
    actor.is_some_and(|actor| can_act(actor, collection_owner_id))
}
