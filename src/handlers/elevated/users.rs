// handlers/elevated/users.rs - User administration
//
// GET    /admin/users
// GET    /admin/users/:user_id
// PATCH  /admin/users/:user_id/block
// PATCH  /admin/users/:user_id/unblock
// PATCH  /admin/users/:user_id/addAdmin
// PATCH  /admin/users/:user_id/removeAdmin
// DELETE /admin/users/:user_id

use axum::extract::State;
use serde_json::Value;

use crate::app::AppState;
use crate::database::models::{User, UserStatus};
use crate::middleware::{ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::{admin, AuthenticatedUser};

pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let users = admin::list_users(state.store.as_ref()).await?;
    Ok(ApiResponse::success(users))
}

pub async fn show(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i32>,
) -> ApiResult<AuthenticatedUser> {
    let user = admin::get_user(state.store.as_ref(), user_id).await?;
    Ok(ApiResponse::success(user))
}

pub async fn block(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(user_id): ApiPath<i32>,
) -> ApiResult<Value> {
    tracing::info!("Admin {} blocking user {}", actor.user_id(), user_id);
    admin::set_status(state.store.as_ref(), user_id, UserStatus::Blocked).await?;
    Ok(ApiResponse::message("The user has been successfully blocked."))
}

pub async fn unblock(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(user_id): ApiPath<i32>,
) -> ApiResult<Value> {
    tracing::info!("Admin {} unblocking user {}", actor.user_id(), user_id);
    admin::set_status(state.store.as_ref(), user_id, UserStatus::Active).await?;
    Ok(ApiResponse::message("The user has been successfully unblocked."))
}

pub async fn add_admin(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i32>,
) -> ApiResult<Value> {
    admin::grant_admin(state.store.as_ref(), user_id).await?;
    Ok(ApiResponse::message("Admin role successfully added"))
}

pub async fn remove_admin(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i32>,
) -> ApiResult<Value> {
    admin::revoke_admin(state.store.as_ref(), user_id).await?;
    Ok(ApiResponse::message("Admin role successfully removed"))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(user_id): ApiPath<i32>,
) -> ApiResult<Value> {
    tracing::info!("Admin {} deleting user {}", actor.user_id(), user_id);
    admin::delete_user(state.store.as_ref(), user_id).await?;
    Ok(ApiResponse::message("User deleted successfully"))
}
