use crate::database::models::{User, UserStatus, ROLE_ADMIN};
use crate::database::Store;
use crate::error::ApiError;

use super::session::{with_roles, AuthenticatedUser};

pub async fn find_user(store: &dyn Store, user_id: i32) -> Result<User, ApiError> {
    store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub async fn find_user_by_username(store: &dyn Store, username: &str) -> Result<User, ApiError> {
    store
        .find_user_by_username(&username.to_lowercase())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub async fn list_users(store: &dyn Store) -> Result<Vec<User>, ApiError> {
    Ok(store.list_users().await?)
}

/// One user with role names
pub async fn get_user(store: &dyn Store, user_id: i32) -> Result<AuthenticatedUser, ApiError> {
    let user = find_user(store, user_id).await?;
    with_roles(store, user).await
}

pub async fn set_status(store: &dyn Store, user_id: i32, status: UserStatus) -> Result<(), ApiError> {
    find_user(store, user_id).await?;
    store.set_user_status(user_id, status).await?;
    tracing::info!("User {} is now {}", user_id, status.as_str());
    Ok(())
}

pub async fn grant_admin(store: &dyn Store, user_id: i32) -> Result<(), ApiError> {
    find_user(store, user_id).await?;
    let role = store
        .find_role_by_name(ROLE_ADMIN)
        .await?
        .ok_or_else(|| ApiError::not_found("Admin role not found"))?;

    if store.user_has_role(user_id, role.role_id).await? {
        return Err(ApiError::conflict("User already has the admin role"));
    }
    store.add_user_role(user_id, role.role_id).await?;
    tracing::info!("Granted admin role to user {}", user_id);
    Ok(())
}

pub async fn revoke_admin(store: &dyn Store, user_id: i32) -> Result<(), ApiError> {
    find_user(store, user_id).await?;
    let role = store
        .find_role_by_name(ROLE_ADMIN)
        .await?
        .ok_or_else(|| ApiError::not_found("Admin role not found"))?;

    if !store.user_has_role(user_id, role.role_id).await? {
        return Err(ApiError::conflict("User does not have the admin role to remove"));
    }
    store.remove_user_role(user_id, role.role_id).await?;
    tracing::info!("Revoked admin role from user {}", user_id);
    Ok(())
}

/// Removes the user along with their collections, items and role links
pub async fn delete_user(store: &dyn Store, user_id: i32) -> Result<(), ApiError> {
    find_user(store, user_id).await?;
    store.delete_user(user_id).await?;
    tracing::info!("Deleted user {}", user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Theme;
    use crate::services::collections::{self, CreateCollection};
    use crate::testing::{fixtures, MemoryStore};

    #[tokio::test]
    async fn granting_twice_conflicts() {
        let store = MemoryStore::seeded();
        let user = fixtures::user(&store, "alice", &[]).await;

        grant_admin(&store, user.user_id).await.unwrap();
        let err = grant_admin(&store, user.user_id).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(msg) if msg == "User already has the admin role"));
        assert_eq!(get_user(&store, user.user_id).await.unwrap().roles, ["User", "Admin"]);
    }

    #[tokio::test]
    async fn revoking_from_non_admin_conflicts() {
        let store = MemoryStore::seeded();
        let user = fixtures::user(&store, "alice", &[]).await;

        let err = revoke_admin(&store, user.user_id).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        grant_admin(&store, user.user_id).await.unwrap();
        revoke_admin(&store, user.user_id).await.unwrap();
        assert_eq!(get_user(&store, user.user_id).await.unwrap().roles, ["User"]);
    }

    #[tokio::test]
    async fn user_is_checked_before_role() {
        let store = MemoryStore::without_admin_role();
        let err = grant_admin(&store, 42).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(msg) if msg == "User not found"));

        let user = fixtures::user(&store, "alice", &[]).await;
        let err = grant_admin(&store, user.user_id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(msg) if msg == "Admin role not found"));
    }

    #[tokio::test]
    async fn block_and_unblock() {
        let store = MemoryStore::seeded();
        let user = fixtures::user(&store, "alice", &[]).await;

        set_status(&store, user.user_id, UserStatus::Blocked).await.unwrap();
        assert!(find_user(&store, user.user_id).await.unwrap().is_blocked());
        set_status(&store, user.user_id, UserStatus::Active).await.unwrap();
        assert!(!find_user(&store, user.user_id).await.unwrap().is_blocked());

        assert!(matches!(
            set_status(&store, 999, UserStatus::Blocked).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn deleting_a_user_cascades_to_collections() {
        let store = MemoryStore::seeded();
        let alice = fixtures::signed_in(&store, "alice", &[]).await;
        collections::create(
            &store,
            &alice,
            CreateCollection {
                title: "Books".to_string(),
                description: None,
                theme: Theme::Books,
                image_url: None,
                item_fields: vec![],
            },
        )
        .await
        .unwrap();

        delete_user(&store, alice.user_id()).await.unwrap();
        assert!(list_users(&store).await.unwrap().is_empty());
        assert!(collections::biggest(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn username_lookup_is_case_insensitive() {
        let store = MemoryStore::seeded();
        let user = fixtures::user(&store, "alice", &[]).await;
        assert_eq!(find_user_by_username(&store, "ALICE").await.unwrap().user_id, user.user_id);
    }
}
