use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use crate::database::models::{
    Collection, CollectionChanges, CollectionRanking, CollectionWithOwner, Item, ItemChanges,
    ItemField, ItemFieldValue, ItemSummary, Language, NewCollection, NewItem, NewItemField,
    NewUser, Page, Role, Tag, UiTheme, User, UserStatus, ROLE_ADMIN, ROLE_USER,
};
use crate::database::{DatabaseError, Store, StoreResult};

#[derive(Default)]
struct State {
    next_id: i32,
    clock: i64,
    users: BTreeMap<i32, User>,
    roles: Vec<Role>,
    user_roles: Vec<(i32, i32)>,
    collections: BTreeMap<i32, Collection>,
    fields: Vec<ItemField>,
    items: BTreeMap<i32, Item>,
    values: Vec<ItemFieldValue>,
    tags: Vec<Tag>,
    item_tags: Vec<(i32, i32)>,
}

impl State {
    fn id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    /// Strictly increasing timestamps keep "newest first" orderings stable
    fn now(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(self.clock)
    }

    fn owner_username(&self, author_id: i32) -> String {
        self.users
            .get(&author_id)
            .map(|user| user.username.clone())
            .unwrap_or_default()
    }

    fn remove_item(&mut self, item_id: i32) {
        self.items.remove(&item_id);
        self.values.retain(|value| value.item_id != item_id);
        self.item_tags.retain(|(item, _)| *item != item_id);
    }

    fn remove_collection(&mut self, collection_id: i32) {
        self.collections.remove(&collection_id);
        self.fields.retain(|field| field.collection_id != collection_id);
        let item_ids: Vec<i32> = self
            .items
            .values()
            .filter(|item| item.collection_id == collection_id)
            .map(|item| item.item_id)
            .collect();
        for item_id in item_ids {
            self.remove_item(item_id);
        }
    }
}

/// In-memory `Store` with the same cascade rules as the SQL schema, plus
/// failure injection for exercising partial-write paths.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    failing: Mutex<HashSet<&'static str>>,
    conflicting: Mutex<HashSet<&'static str>>,
}

/// Width of the schema's `VARCHAR(255)` columns
const VARCHAR_WIDTH: usize = 255;

fn fits(column: &str, value: &str) -> StoreResult<()> {
    if value.chars().count() > VARCHAR_WIDTH {
        Err(DatabaseError::QueryError(format!(
            "value too long for {} (character varying({}))",
            column, VARCHAR_WIDTH
        )))
    } else {
        Ok(())
    }
}

impl MemoryStore {
    /// Store with the `User` and `Admin` roles, as the initial migration seeds
    pub fn seeded() -> Self {
        let store = Self::default();
        store.insert_role(ROLE_USER);
        store.insert_role(ROLE_ADMIN);
        store
    }

    /// Role catalog missing `Admin`
    pub fn without_admin_role() -> Self {
        let store = Self::default();
        store.insert_role(ROLE_USER);
        store
    }

    fn insert_role(&self, name: &str) {
        let mut state = self.state.lock();
        let role_id = state.id();
        state.roles.push(Role {
            role_id,
            role_name: name.to_string(),
        });
    }

    /// Make every later call to `operation` fail
    pub fn fail_on(&self, operation: &'static str) {
        self.failing.lock().insert(operation);
    }

    /// Make every later call to `operation` hit a unique constraint
    pub fn conflict_on(&self, operation: &'static str) {
        self.conflicting.lock().insert(operation);
    }

    fn check(&self, operation: &'static str) -> StoreResult<()> {
        if self.conflicting.lock().contains(operation) {
            return Err(DatabaseError::Duplicate(format!("{}_unique", operation)));
        }
        if self.failing.lock().contains(operation) {
            Err(DatabaseError::QueryError(format!("injected failure in {}", operation)))
        } else {
            Ok(())
        }
    }

    pub fn item_count(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn field_count(&self) -> usize {
        self.state.lock().fields.len()
    }

    pub fn value_count(&self) -> usize {
        self.state.lock().values.len()
    }
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, i32)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn paginate<T>(rows: Vec<T>, page: Page) -> Vec<T> {
    rows.into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, user_id: i32) -> StoreResult<Option<User>> {
        self.check("find_user")?;
        Ok(self.state.lock().users.get(&user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.check("find_user_by_username")?;
        let state = self.state.lock();
        Ok(state.users.values().find(|user| user.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.check("find_user_by_email")?;
        let state = self.state.lock();
        Ok(state.users.values().find(|user| user.email == email).cloned())
    }

    async fn insert_user(&self, new_user: NewUser) -> StoreResult<User> {
        self.check("insert_user")?;
        fits("users.email", &new_user.email)?;
        fits("users.username", &new_user.username)?;
        let mut state = self.state.lock();
        if state
            .users
            .values()
            .any(|user| user.email == new_user.email || user.username == new_user.username)
        {
            return Err(DatabaseError::Duplicate("users_email_username_key".to_string()));
        }
        let user_id = state.id();
        let now = state.now();
        let user = User {
            user_id,
            email: new_user.email,
            username: new_user.username,
            password: new_user.password_hash,
            last_action: Some(new_user.last_action),
            language: Language::En,
            theme: UiTheme::Light,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user_id, user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.check("list_users")?;
        Ok(self.state.lock().users.values().cloned().collect())
    }

    async fn set_user_status(&self, user_id: i32, status: UserStatus) -> StoreResult<()> {
        self.check("set_user_status")?;
        let mut state = self.state.lock();
        let now = state.now();
        if let Some(user) = state.users.get_mut(&user_id) {
            user.status = status;
            user.updated_at = now;
        }
        Ok(())
    }

    async fn touch_last_action(&self, user_id: i32, at: DateTime<Utc>) -> StoreResult<()> {
        self.check("touch_last_action")?;
        if let Some(user) = self.state.lock().users.get_mut(&user_id) {
            user.last_action = Some(at);
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: i32) -> StoreResult<()> {
        self.check("delete_user")?;
        let mut state = self.state.lock();
        state.users.remove(&user_id);
        state.user_roles.retain(|(user, _)| *user != user_id);
        let owned: Vec<i32> = state
            .collections
            .values()
            .filter(|collection| collection.author_id == user_id)
            .map(|collection| collection.collection_id)
            .collect();
        for collection_id in owned {
            state.remove_collection(collection_id);
        }
        Ok(())
    }

    async fn find_role_by_name(&self, role_name: &str) -> StoreResult<Option<Role>> {
        self.check("find_role_by_name")?;
        let state = self.state.lock();
        Ok(state.roles.iter().find(|role| role.role_name == role_name).cloned())
    }

    async fn user_roles(&self, user_id: i32) -> StoreResult<Vec<Role>> {
        self.check("user_roles")?;
        let state = self.state.lock();
        let mut roles: Vec<Role> = state
            .roles
            .iter()
            .filter(|role| state.user_roles.contains(&(user_id, role.role_id)))
            .cloned()
            .collect();
        roles.sort_by_key(|role| role.role_id);
        Ok(roles)
    }

    async fn user_has_role(&self, user_id: i32, role_id: i32) -> StoreResult<bool> {
        self.check("user_has_role")?;
        Ok(self.state.lock().user_roles.contains(&(user_id, role_id)))
    }

    async fn add_user_role(&self, user_id: i32, role_id: i32) -> StoreResult<()> {
        self.check("add_user_role")?;
        let mut state = self.state.lock();
        if !state.user_roles.contains(&(user_id, role_id)) {
            state.user_roles.push((user_id, role_id));
        }
        Ok(())
    }

    async fn remove_user_role(&self, user_id: i32, role_id: i32) -> StoreResult<()> {
        self.check("remove_user_role")?;
        self.state
            .lock()
            .user_roles
            .retain(|link| *link != (user_id, role_id));
        Ok(())
    }

    async fn insert_collection(&self, new: NewCollection) -> StoreResult<Collection> {
        self.check("insert_collection")?;
        fits("collections.title", &new.title)?;
        fits("collections.image_url", new.image_url.as_deref().unwrap_or_default())?;
        let mut state = self.state.lock();
        let collection_id = state.id();
        let now = state.now();
        let collection = Collection {
            collection_id,
            title: new.title,
            description: new.description,
            theme: new.theme,
            image_url: new.image_url,
            author_id: new.author_id,
            created_at: now,
            updated_at: now,
        };
        state.collections.insert(collection_id, collection.clone());
        Ok(collection)
    }

    async fn find_collection(&self, collection_id: i32) -> StoreResult<Option<CollectionWithOwner>> {
        self.check("find_collection")?;
        let state = self.state.lock();
        Ok(state.collections.get(&collection_id).map(|collection| CollectionWithOwner {
            owner_username: state.owner_username(collection.author_id),
            collection: collection.clone(),
        }))
    }

    async fn list_collections(&self, page: Page) -> StoreResult<Vec<Collection>> {
        self.check("list_collections")?;
        let mut rows: Vec<Collection> = self.state.lock().collections.values().cloned().collect();
        newest_first(&mut rows, |c| (c.created_at, c.collection_id));
        Ok(paginate(rows, page))
    }

    async fn list_user_collections(&self, author_id: i32, page: Page) -> StoreResult<Vec<Collection>> {
        self.check("list_user_collections")?;
        let mut rows: Vec<Collection> = self
            .state
            .lock()
            .collections
            .values()
            .filter(|collection| collection.author_id == author_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |c| (c.created_at, c.collection_id));
        Ok(paginate(rows, page))
    }

    async fn collections_by_item_count(&self) -> StoreResult<Vec<CollectionRanking>> {
        self.check("collections_by_item_count")?;
        let state = self.state.lock();
        let mut rows: Vec<CollectionRanking> = state
            .collections
            .values()
            .map(|collection| CollectionRanking {
                owner_username: state.owner_username(collection.author_id),
                item_amount: state
                    .items
                    .values()
                    .filter(|item| item.collection_id == collection.collection_id)
                    .count() as i64,
                collection: collection.clone(),
            })
            .collect();
        rows.sort_by(|a, b| {
            (b.item_amount, b.collection.created_at, b.collection.collection_id).cmp(&(
                a.item_amount,
                a.collection.created_at,
                a.collection.collection_id,
            ))
        });
        Ok(rows)
    }

    async fn update_collection(&self, collection_id: i32, changes: CollectionChanges) -> StoreResult<()> {
        self.check("update_collection")?;
        fits("collections.title", changes.title.as_deref().unwrap_or_default())?;
        fits("collections.image_url", changes.image_url.as_deref().unwrap_or_default())?;
        let mut state = self.state.lock();
        let now = state.now();
        if let Some(collection) = state.collections.get_mut(&collection_id) {
            if let Some(title) = changes.title {
                collection.title = title;
            }
            if let Some(description) = changes.description {
                collection.description = Some(description);
            }
            if let Some(theme) = changes.theme {
                collection.theme = theme;
            }
            if let Some(image_url) = changes.image_url {
                collection.image_url = Some(image_url);
            }
            collection.updated_at = now;
        }
        Ok(())
    }

    async fn delete_collection(&self, collection_id: i32) -> StoreResult<()> {
        self.check("delete_collection")?;
        self.state.lock().remove_collection(collection_id);
        Ok(())
    }

    async fn insert_item_fields(
        &self,
        collection_id: i32,
        fields: &[NewItemField],
    ) -> StoreResult<Vec<ItemField>> {
        self.check("insert_item_fields")?;
        for field in fields {
            fits("item_fields.field_name", &field.field_name)?;
        }
        let mut state = self.state.lock();
        let mut inserted = Vec::with_capacity(fields.len());
        for field in fields {
            let field_id = state.id();
            let row = ItemField {
                field_id,
                collection_id,
                field_name: field.field_name.clone(),
                field_type: field.field_type,
            };
            state.fields.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn item_fields(&self, collection_id: i32) -> StoreResult<Vec<ItemField>> {
        self.check("item_fields")?;
        let state = self.state.lock();
        Ok(state
            .fields
            .iter()
            .filter(|field| field.collection_id == collection_id)
            .cloned()
            .collect())
    }

    async fn insert_item(&self, new: NewItem) -> StoreResult<Item> {
        self.check("insert_item")?;
        fits("items.title", &new.title)?;
        fits("items.image_url", new.image_url.as_deref().unwrap_or_default())?;
        let mut state = self.state.lock();
        let item_id = state.id();
        let now = state.now();
        let item = Item {
            item_id,
            collection_id: new.collection_id,
            title: new.title,
            hidden: new.hidden,
            image_url: new.image_url,
            created_at: now,
            updated_at: now,
        };
        state.items.insert(item_id, item.clone());
        Ok(item)
    }

    async fn find_item(&self, item_id: i32) -> StoreResult<Option<Item>> {
        self.check("find_item")?;
        Ok(self.state.lock().items.get(&item_id).cloned())
    }

    async fn list_items(&self, collection_id: i32, include_hidden: bool) -> StoreResult<Vec<Item>> {
        self.check("list_items")?;
        let mut rows: Vec<Item> = self
            .state
            .lock()
            .items
            .values()
            .filter(|item| item.collection_id == collection_id && (include_hidden || !item.hidden))
            .cloned()
            .collect();
        newest_first(&mut rows, |i| (i.created_at, i.item_id));
        Ok(rows)
    }

    async fn list_visible_items(&self) -> StoreResult<Vec<ItemSummary>> {
        self.check("list_visible_items")?;
        let state = self.state.lock();
        let mut rows: Vec<ItemSummary> = state
            .items
            .values()
            .filter(|item| !item.hidden)
            .filter_map(|item| {
                let collection = state.collections.get(&item.collection_id)?;
                Some(ItemSummary {
                    item: item.clone(),
                    collection_title: collection.title.clone(),
                    owner_username: state.owner_username(collection.author_id),
                })
            })
            .collect();
        newest_first(&mut rows, |s| (s.item.created_at, s.item.item_id));
        Ok(rows)
    }

    async fn update_item(&self, item_id: i32, changes: ItemChanges) -> StoreResult<()> {
        self.check("update_item")?;
        fits("items.title", changes.title.as_deref().unwrap_or_default())?;
        fits("items.image_url", changes.image_url.as_deref().unwrap_or_default())?;
        let mut state = self.state.lock();
        let now = state.now();
        if let Some(item) = state.items.get_mut(&item_id) {
            if let Some(title) = changes.title {
                item.title = title;
            }
            if let Some(hidden) = changes.hidden {
                item.hidden = hidden;
            }
            if let Some(image_url) = changes.image_url {
                item.image_url = Some(image_url);
            }
            item.updated_at = now;
        }
        Ok(())
    }

    async fn delete_item(&self, item_id: i32) -> StoreResult<()> {
        self.check("delete_item")?;
        self.state.lock().remove_item(item_id);
        Ok(())
    }

    async fn insert_field_value(&self, item_id: i32, field_id: i32, value: Value) -> StoreResult<()> {
        self.check("insert_field_value")?;
        let mut state = self.state.lock();
        if state
            .values
            .iter()
            .any(|v| v.item_id == item_id && v.field_id == field_id)
        {
            return Err(DatabaseError::QueryError("duplicate field value".to_string()));
        }
        let value_id = state.id();
        state.values.push(ItemFieldValue {
            value_id,
            item_id,
            field_id,
            value,
        });
        Ok(())
    }

    async fn upsert_field_value(&self, item_id: i32, field_id: i32, value: Value) -> StoreResult<()> {
        self.check("upsert_field_value")?;
        let mut state = self.state.lock();
        if let Some(existing) = state
            .values
            .iter_mut()
            .find(|v| v.item_id == item_id && v.field_id == field_id)
        {
            existing.value = value;
            return Ok(());
        }
        let value_id = state.id();
        state.values.push(ItemFieldValue {
            value_id,
            item_id,
            field_id,
            value,
        });
        Ok(())
    }

    async fn item_field_values(&self, item_id: i32) -> StoreResult<Vec<ItemFieldValue>> {
        self.check("item_field_values")?;
        let state = self.state.lock();
        let mut values: Vec<ItemFieldValue> = state
            .values
            .iter()
            .filter(|value| value.item_id == item_id)
            .cloned()
            .collect();
        values.sort_by_key(|value| value.field_id);
        Ok(values)
    }

    async fn find_or_create_tag(&self, tag_name: &str) -> StoreResult<Tag> {
        self.check("find_or_create_tag")?;
        let mut state = self.state.lock();
        if let Some(tag) = state.tags.iter().find(|tag| tag.tag_name == tag_name) {
            return Ok(tag.clone());
        }
        let tag_id = state.id();
        let now = state.now();
        let tag = Tag {
            tag_id,
            tag_name: tag_name.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.tags.push(tag.clone());
        Ok(tag)
    }

    async fn clear_item_tags(&self, item_id: i32) -> StoreResult<()> {
        self.check("clear_item_tags")?;
        self.state.lock().item_tags.retain(|(item, _)| *item != item_id);
        Ok(())
    }

    async fn link_item_tag(&self, item_id: i32, tag_id: i32) -> StoreResult<()> {
        self.check("link_item_tag")?;
        let mut state = self.state.lock();
        if !state.item_tags.contains(&(item_id, tag_id)) {
            state.item_tags.push((item_id, tag_id));
        }
        Ok(())
    }

    async fn item_tags(&self, item_id: i32) -> StoreResult<Vec<Tag>> {
        self.check("item_tags")?;
        let state = self.state.lock();
        Ok(state
            .item_tags
            .iter()
            .filter(|(item, _)| *item == item_id)
            .filter_map(|(_, tag_id)| state.tags.iter().find(|tag| tag.tag_id == *tag_id).cloned())
            .collect())
    }
}
