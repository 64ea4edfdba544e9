use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    Active,
    Blocked,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "Active",
            UserStatus::Blocked => "Blocked",
        }
    }
}

impl TryFrom<String> for UserStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Active" => Ok(UserStatus::Active),
            "Blocked" => Ok(UserStatus::Blocked),
            _ => Err(UnknownVariant::new("status", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "EN")]
    En,
    #[serde(rename = "GE")]
    Ge,
}

impl TryFrom<String> for Language {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "EN" => Ok(Language::En),
            "GE" => Ok(Language::Ge),
            _ => Err(UnknownVariant::new("language", value)),
        }
    }
}

/// Interface theme preference (not to be confused with a collection theme)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiTheme {
    Light,
    Dark,
}

impl TryFrom<String> for UiTheme {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Light" => Ok(UiTheme::Light),
            "Dark" => Ok(UiTheme::Dark),
            _ => Err(UnknownVariant::new("theme", value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: i32,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub last_action: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    pub language: Language,
    #[sqlx(try_from = "String")]
    pub theme: UiTheme,
    #[sqlx(try_from = "String")]
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_blocked(&self) -> bool {
        self.status == UserStatus::Blocked
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub last_action: DateTime<Utc>,
}
