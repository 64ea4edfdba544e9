use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    #[serde(rename = "Toy Cars")]
    ToyCars,
    Books,
    Coins,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::ToyCars => "Toy Cars",
            Theme::Books => "Books",
            Theme::Coins => "Coins",
        }
    }
}

impl TryFrom<String> for Theme {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Toy Cars" => Ok(Theme::ToyCars),
            "Books" => Ok(Theme::Books),
            "Coins" => Ok(Theme::Coins),
            _ => Err(UnknownVariant::new("collection theme", value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub collection_id: i32,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub theme: Theme,
    pub image_url: Option<String>,
    pub author_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Collection joined with its author's username
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CollectionWithOwner {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub collection: Collection,
    pub owner_username: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRanking {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub collection: Collection,
    pub owner_username: String,
    pub item_amount: i64,
}

#[derive(Debug, Clone)]
pub struct NewCollection {
    pub title: String,
    pub description: Option<String>,
    pub theme: Theme,
    pub image_url: Option<String>,
    pub author_id: i32,
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct CollectionChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub theme: Option<Theme>,
    pub image_url: Option<String>,
}
