//! Signup and login. Both answer with a freshly issued session token.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, verify_password, TokenKeys};
use crate::database::models::{NewUser, ROLE_USER};
use crate::database::{DatabaseError, Store};
use crate::error::ApiError;

use super::input::{Checks, MAX_TEXT_LENGTH};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "passwordConfirm")]
    pub password_confirm: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub async fn signup(
    store: &dyn Store,
    keys: &TokenKeys,
    bcrypt_cost: u32,
    input: SignupRequest,
) -> Result<TokenResponse, ApiError> {
    let mut checks = Checks::new();
    checks.email("email", input.email.trim());
    checks.max_len("email", input.email.trim(), MAX_TEXT_LENGTH);
    checks.not_blank("username", &input.username, "Username is required");
    checks.max_len("username", input.username.trim(), MAX_TEXT_LENGTH);
    checks.not_blank("password", &input.password, "Password is required");
    checks.not_blank("passwordConfirm", &input.password_confirm, "Password confirmation is required");
    checks.finish("Invalid registration data")?;

    let email = input.email.trim().to_lowercase();
    let username = input.username.trim().to_lowercase();

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request("User with this email already exists"));
    }
    if store.find_user_by_username(&username).await?.is_some() {
        return Err(ApiError::bad_request("User with this username already exists"));
    }
    if input.password != input.password_confirm {
        return Err(ApiError::bad_request("Passwords are not same"));
    }

    let role = store.find_role_by_name(ROLE_USER).await?.ok_or_else(|| {
        tracing::error!("Role '{}' is missing; was the database migrated?", ROLE_USER);
        ApiError::internal_server_error("User role not found.")
    })?;

    let password_hash = hash_password(input.password, bcrypt_cost).await?;
    let inserted = store
        .insert_user(NewUser {
            email: email.clone(),
            username,
            password_hash,
            last_action: Utc::now(),
        })
        .await;
    let user = match inserted {
        Ok(user) => user,
        // Lost a race with a concurrent signup for the same email or username
        Err(DatabaseError::Duplicate(_)) => return Err(taken(store, &email).await),
        Err(err) => return Err(err.into()),
    };
    store.add_user_role(user.user_id, role.role_id).await?;

    tracing::info!("Registered user {} ({})", user.user_id, user.username);
    Ok(TokenResponse {
        token: keys.issue(user.user_id)?,
    })
}

async fn taken(store: &dyn Store, email: &str) -> ApiError {
    match store.find_user_by_email(email).await {
        Ok(Some(_)) => ApiError::bad_request("User with this email already exists"),
        _ => ApiError::bad_request("User with this username already exists"),
    }
}

pub async fn login(
    store: &dyn Store,
    keys: &TokenKeys,
    input: LoginRequest,
) -> Result<TokenResponse, ApiError> {
    let mut checks = Checks::new();
    checks.not_blank("username", &input.username, "Username is required");
    checks.not_blank("password", &input.password, "Password is required");
    checks.finish("Invalid login data")?;

    let username = input.username.trim().to_lowercase();
    let wrong_credentials = || ApiError::unauthorized("Wrong username or password");

    let Some(user) = store.find_user_by_username(&username).await? else {
        tracing::warn!("Login attempt for unknown user '{}'", username);
        return Err(wrong_credentials());
    };

    if !verify_password(input.password, user.password.clone()).await? {
        tracing::warn!("Wrong password for user {}", user.user_id);
        return Err(wrong_credentials());
    }

    if user.is_blocked() {
        tracing::warn!("Blocked user {} tried to log in", user.user_id);
        return Err(ApiError::forbidden(
            "Your account is blocked. Ask for permissions and try again later",
        ));
    }

    if let Err(e) = store.touch_last_action(user.user_id, Utc::now()).await {
        tracing::warn!("Failed to stamp last action for user {}: {}", user.user_id, e);
    }
    Ok(TokenResponse {
        token: keys.issue(user.user_id)?,
    })
}
