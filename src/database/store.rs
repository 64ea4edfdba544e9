use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::manager::DatabaseError;
use super::models::{
    Collection, CollectionChanges, CollectionRanking, CollectionWithOwner, Item, ItemChanges,
    ItemField, ItemFieldValue, ItemSummary, NewCollection, NewItem, NewItemField, NewUser, Page,
    Role, Tag, User, UserStatus,
};

pub type StoreResult<T> = Result<T, DatabaseError>;

/// Repository over the relational schema.
///
/// Associations are explicit functions on foreign-key columns. Cascades
/// (user → collections → items → values/tag links) are the store's
/// responsibility: deleting a parent must remove its dependents.
/// Every call is a single statement; callers sequence multi-step writes.
#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn find_user(&self, user_id: i32) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn set_user_status(&self, user_id: i32, status: UserStatus) -> StoreResult<()>;
    async fn touch_last_action(&self, user_id: i32, at: DateTime<Utc>) -> StoreResult<()>;
    async fn delete_user(&self, user_id: i32) -> StoreResult<()>;

    // Roles
    async fn find_role_by_name(&self, role_name: &str) -> StoreResult<Option<Role>>;
    async fn user_roles(&self, user_id: i32) -> StoreResult<Vec<Role>>;
    async fn user_has_role(&self, user_id: i32, role_id: i32) -> StoreResult<bool>;
    async fn add_user_role(&self, user_id: i32, role_id: i32) -> StoreResult<()>;
    async fn remove_user_role(&self, user_id: i32, role_id: i32) -> StoreResult<()>;

    // Collections and their field schema
    async fn insert_collection(&self, collection: NewCollection) -> StoreResult<Collection>;
    async fn find_collection(&self, collection_id: i32) -> StoreResult<Option<CollectionWithOwner>>;
    async fn list_collections(&self, page: Page) -> StoreResult<Vec<Collection>>;
    async fn list_user_collections(&self, author_id: i32, page: Page) -> StoreResult<Vec<Collection>>;
    async fn collections_by_item_count(&self) -> StoreResult<Vec<CollectionRanking>>;
    async fn update_collection(&self, collection_id: i32, changes: CollectionChanges) -> StoreResult<()>;
    async fn delete_collection(&self, collection_id: i32) -> StoreResult<()>;
    async fn insert_item_fields(
        &self,
        collection_id: i32,
        fields: &[NewItemField],
    ) -> StoreResult<Vec<ItemField>>;
    async fn item_fields(&self, collection_id: i32) -> StoreResult<Vec<ItemField>>;

    // Items and values
    async fn insert_item(&self, item: NewItem) -> StoreResult<Item>;
    async fn find_item(&self, item_id: i32) -> StoreResult<Option<Item>>;
    async fn list_items(&self, collection_id: i32, include_hidden: bool) -> StoreResult<Vec<Item>>;
    async fn list_visible_items(&self) -> StoreResult<Vec<ItemSummary>>;
    async fn update_item(&self, item_id: i32, changes: ItemChanges) -> StoreResult<()>;
    async fn delete_item(&self, item_id: i32) -> StoreResult<()>;
    async fn insert_field_value(&self, item_id: i32, field_id: i32, value: Value) -> StoreResult<()>;
    async fn upsert_field_value(&self, item_id: i32, field_id: i32, value: Value) -> StoreResult<()>;
    async fn item_field_values(&self, item_id: i32) -> StoreResult<Vec<ItemFieldValue>>;

    // Tags
    async fn find_or_create_tag(&self, tag_name: &str) -> StoreResult<Tag>;
    async fn clear_item_tags(&self, item_id: i32) -> StoreResult<()>;
    async fn link_item_tag(&self, item_id: i32, tag_id: i32) -> StoreResult<()>;
    async fn item_tags(&self, item_id: i32) -> StoreResult<Vec<Tag>>;
}
