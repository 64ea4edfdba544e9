use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub item_id: i32,
    pub collection_id: i32,
    pub title: String,
    pub hidden: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public listing row: item plus the owning collection's title and author
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: Item,
    pub collection_title: String,
    pub owner_username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ItemFieldValue {
    pub value_id: i32,
    pub item_id: i32,
    pub field_id: i32,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub collection_id: i32,
    pub title: String,
    pub hidden: bool,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    pub title: Option<String>,
    pub hidden: Option<bool>,
    pub image_url: Option<String>,
}

impl ItemChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.hidden.is_none() && self.image_url.is_none()
    }
}
