mod memory_store;

pub use memory_store::MemoryStore;

/// Builders for users and actors used across service tests
pub mod fixtures {
    use chrono::{Duration, Utc};

    use crate::database::models::{Language, NewUser, UiTheme, User, UserStatus, ROLE_USER};
    use crate::database::Store;
    use crate::services::session::AuthenticatedUser;

    use super::MemoryStore;

    /// Insert a user holding `User` plus `extra_roles`. The password hash is a
    /// placeholder; tests that log in go through signup instead.
    pub async fn user(store: &MemoryStore, username: &str, extra_roles: &[&str]) -> User {
        let user = store
            .insert_user(NewUser {
                email: format!("{}@example.com", username),
                username: username.to_string(),
                password_hash: "not-a-real-hash".to_string(),
                last_action: Utc::now() - Duration::days(1),
            })
            .await
            .unwrap();

        for role_name in std::iter::once(ROLE_USER).chain(extra_roles.iter().copied()) {
            let role = store.find_role_by_name(role_name).await.unwrap().unwrap();
            store.add_user_role(user.user_id, role.role_id).await.unwrap();
        }
        user
    }

    /// Stored user already resolved into an actor
    pub async fn signed_in(store: &MemoryStore, username: &str, extra_roles: &[&str]) -> AuthenticatedUser {
        let user = user(store, username, extra_roles).await;
        crate::services::session::with_roles(store, user).await.unwrap()
    }

    /// Detached actor for pure permission checks
    pub fn actor(user_id: i32, roles: &[&str]) -> AuthenticatedUser {
        let now = Utc::now();
        AuthenticatedUser {
            user: User {
                user_id,
                email: format!("user{}@example.com", user_id),
                username: format!("user{}", user_id),
                password: String::new(),
                last_action: Some(now),
                language: Language::En,
                theme: UiTheme::Light,
                status: UserStatus::Active,
                created_at: now,
                updated_at: now,
            },
            roles: roles.iter().map(|role| role.to_string()).collect(),
        }
    }
}
