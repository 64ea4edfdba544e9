//! Credential/session resolution: `Authorization: Bearer <jwt>` → user.
//!
//! The policy wrapped around token verification:
//! - absent or malformed header → 401
//! - bad signature, garbage or expired token → 401
//! - token for a user that no longer exists → 401
//! - blocked user → 403
//!
//! A resolved user gets `last_action` stamped. That stamp is an audit aid, so
//! failing to write it is logged and otherwise ignored.

use chrono::Utc;
use serde::Serialize;

use crate::auth::TokenKeys;
use crate::database::models::User;
use crate::database::Store;
use crate::error::ApiError;

/// A user whose credential resolved, together with their role names
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> i32 {
        self.user.user_id
    }
}

/// Extract the token from an `Authorization` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, ApiError> {
    let header = header.ok_or_else(|| ApiError::unauthorized("User is not logged in"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Authorization header must use Bearer token format"))?
        .trim();

    if token.is_empty() {
        return Err(ApiError::unauthorized("User is not logged in"));
    }
    Ok(token)
}

pub async fn resolve(
    store: &dyn Store,
    keys: &TokenKeys,
    header: Option<&str>,
) -> Result<AuthenticatedUser, ApiError> {
    let token = bearer_token(header)?;
    let claims = keys.decode(token)?;

    let user = store.find_user(claims.user_id).await?.ok_or_else(|| {
        tracing::warn!("Token for missing user {}", claims.user_id);
        ApiError::unauthorized("User not found")
    })?;

    if user.is_blocked() {
        tracing::warn!("Blocked user {} presented a valid token", user.user_id);
        return Err(ApiError::forbidden(
            "User is blocked. Contact to our service center for additional information.",
        ));
    }

    if let Err(e) = store.touch_last_action(user.user_id, Utc::now()).await {
        tracing::warn!("Failed to stamp last action for user {}: {}", user.user_id, e);
    }

    let actor = with_roles(store, user).await?;
    tracing::debug!("Resolved user {} ({:?})", actor.user.username, actor.roles);
    Ok(actor)
}

/// Like [`resolve`], but a missing header means an anonymous caller.
/// A header that is present must still be valid.
pub async fn resolve_optional(
    store: &dyn Store,
    keys: &TokenKeys,
    header: Option<&str>,
) -> Result<Option<AuthenticatedUser>, ApiError> {
    match header {
        None => Ok(None),
        Some(_) => resolve(store, keys, header).await.map(Some),
    }
}

pub async fn with_roles(store: &dyn Store, user: User) -> Result<AuthenticatedUser, ApiError> {
    let roles = store
        .user_roles(user.user_id)
        .await?
        .into_iter()
        .map(|role| role.role_name)
        .collect();
    Ok(AuthenticatedUser { user, roles })
}
