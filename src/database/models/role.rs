use serde::Serialize;
use sqlx::FromRow;

pub const ROLE_USER: &str = "User";
pub const ROLE_ADMIN: &str = "Admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub role_id: i32,
    pub role_name: String,
}
