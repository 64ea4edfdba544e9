//! Item writes and reads.
//!
//! Writes run as a sequence of single-statement store calls: item row,
//! then one value row per field, then tag links. Every input check happens
//! before the first call, so a failed write can only come from the store.
//! Such a failure part-way through leaves the earlier rows in place.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::database::models::{
    CollectionWithOwner, FieldType, Item, ItemChanges, ItemField, ItemSummary, NewItem, Tag,
};
use crate::database::Store;
use crate::error::ApiError;

use super::collections;
use super::fields::{self, FieldError, ValidatedValue, ValidationMode};
use super::input::{Checks, MAX_TEXT_LENGTH};
use super::permission::{can_view_hidden, ensure_can_act};
use super::session::AuthenticatedUser;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateItem {
    pub title: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, rename = "imageURL", alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub values: Map<String, Value>,
}

/// Absent properties are left unchanged. `tags`, when present, replaces the
/// whole tag set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub hidden: Option<bool>,
    #[serde(default, rename = "imageURL", alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub values: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemValue {
    pub field_id: i32,
    pub field_name: String,
    pub field_type: FieldType,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: Item,
    pub values: Vec<ItemValue>,
    pub tags: Vec<Tag>,
}

impl ItemDetail {
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|tag| tag.tag_name.as_str()).collect()
    }
}

/// Run field and tag validation, merging their violations with `checks`
fn validate_input(
    mut checks: Checks,
    values: &Map<String, Value>,
    schema: &[ItemField],
    mode: ValidationMode,
    tags: Option<&[String]>,
) -> Result<(Vec<ValidatedValue>, Option<Vec<String>>), ApiError> {
    let validated = match fields::validate(values, schema, mode) {
        Ok(validated) => validated,
        Err(FieldError::Violations(violations)) => {
            checks.extend(violations);
            Vec::new()
        }
        Err(err) => return Err(err.into()),
    };

    let tags = match tags.map(fields::normalize_tags).transpose() {
        Ok(tags) => tags,
        Err(FieldError::Violations(violations)) => {
            checks.extend(violations);
            None
        }
        Err(err) => return Err(err.into()),
    };

    checks.finish("Item values do not match the collection fields")?;
    Ok((validated, tags))
}

/// Collection from the path plus an item that must belong to it
async fn find_in_collection(
    store: &dyn Store,
    collection_id: i32,
    item_id: i32,
) -> Result<(CollectionWithOwner, Item), ApiError> {
    let collection = collections::find(store, collection_id).await?;
    let item = store
        .find_item(item_id)
        .await?
        .filter(|item| item.collection_id == collection_id)
        .ok_or_else(|| ApiError::not_found("Item not found"))?;
    Ok((collection, item))
}

/// Replace the item's tag set with exactly `names`
async fn reconcile_tags(store: &dyn Store, item_id: i32, names: &[String]) -> Result<(), ApiError> {
    store.clear_item_tags(item_id).await?;
    for name in names {
        let tag = store.find_or_create_tag(name).await?;
        store.link_item_tag(item_id, tag.tag_id).await?;
    }
    Ok(())
}

async fn detail(store: &dyn Store, item: Item) -> Result<ItemDetail, ApiError> {
    let schema = store.item_fields(item.collection_id).await?;
    let stored = store.item_field_values(item.item_id).await?;

    let values = schema
        .into_iter()
        .filter_map(|field| {
            let value = stored.iter().find(|v| v.field_id == field.field_id)?;
            Some(ItemValue {
                field_id: field.field_id,
                field_name: field.field_name,
                field_type: field.field_type,
                value: value.value.clone(),
            })
        })
        .collect();

    let tags = store.item_tags(item.item_id).await?;
    Ok(ItemDetail { item, values, tags })
}

pub async fn create(
    store: &dyn Store,
    actor: &AuthenticatedUser,
    collection_id: i32,
    input: CreateItem,
) -> Result<ItemDetail, ApiError> {
    let collection = collections::find(store, collection_id).await?;
    ensure_can_act(
        actor,
        collection.collection.author_id,
        "Only collection owner can add items",
    )?;

    let schema = store.item_fields(collection_id).await?;
    let mut checks = Checks::new();
    checks.not_blank("title", &input.title, "Title is required");
    checks.max_len("title", input.title.trim(), MAX_TEXT_LENGTH);
    checks.image_url("imageURL", input.image_url.as_deref());
    let (validated, tags) = validate_input(
        checks,
        &input.values,
        &schema,
        ValidationMode::Create,
        Some(input.tags.as_slice()),
    )?;

    let item = store
        .insert_item(NewItem {
            collection_id,
            title: input.title.trim().to_string(),
            hidden: input.hidden,
            image_url: input.image_url,
        })
        .await?;

    for value in &validated {
        store
            .insert_field_value(item.item_id, value.field_id, value.value.to_json())
            .await?;
    }
    reconcile_tags(store, item.item_id, tags.as_deref().unwrap_or_default()).await?;

    tracing::info!(
        "User {} created item {} in collection {}",
        actor.user_id(),
        item.item_id,
        collection_id
    );
    detail(store, item).await
}

pub async fn update(
    store: &dyn Store,
    actor: &AuthenticatedUser,
    collection_id: i32,
    item_id: i32,
    input: UpdateItem,
) -> Result<ItemDetail, ApiError> {
    let (collection, _) = find_in_collection(store, collection_id, item_id).await?;
    ensure_can_act(
        actor,
        collection.collection.author_id,
        "Only collection owner can update item",
    )?;

    let schema = store.item_fields(collection_id).await?;
    let mut checks = Checks::new();
    if let Some(title) = &input.title {
        checks.not_blank("title", title, "Title is required");
        checks.max_len("title", title.trim(), MAX_TEXT_LENGTH);
    }
    checks.image_url("imageURL", input.image_url.as_deref());
    let (validated, tags) = validate_input(
        checks,
        &input.values,
        &schema,
        ValidationMode::Update,
        input.tags.as_deref(),
    )?;

    let changes = ItemChanges {
        title: input.title.map(|title| title.trim().to_string()),
        hidden: input.hidden,
        image_url: input.image_url,
    };
    if !changes.is_empty() {
        store.update_item(item_id, changes).await?;
    }

    for value in &validated {
        store
            .upsert_field_value(item_id, value.field_id, value.value.to_json())
            .await?;
    }
    if let Some(tags) = tags {
        reconcile_tags(store, item_id, &tags).await?;
    }

    let item = store
        .find_item(item_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item not found"))?;
    detail(store, item).await
}

pub async fn delete(
    store: &dyn Store,
    actor: &AuthenticatedUser,
    collection_id: i32,
    item_id: i32,
) -> Result<(), ApiError> {
    let (collection, _) = find_in_collection(store, collection_id, item_id).await?;
    ensure_can_act(
        actor,
        collection.collection.author_id,
        "Only owner of collection can delete item",
    )?;

    store.delete_item(item_id).await?;
    tracing::info!("User {} deleted item {}", actor.user_id(), item_id);
    Ok(())
}

/// Items of one collection; hidden ones only for the owner or an admin
pub async fn list(
    store: &dyn Store,
    actor: Option<&AuthenticatedUser>,
    collection_id: i32,
) -> Result<Vec<Item>, ApiError> {
    let collection = collections::find(store, collection_id).await?;
    let include_hidden = can_view_hidden(actor, collection.collection.author_id);
    Ok(store.list_items(collection_id, include_hidden).await?)
}

/// Hidden items look missing to anyone who may not see them
pub async fn get(
    store: &dyn Store,
    actor: Option<&AuthenticatedUser>,
    collection_id: i32,
    item_id: i32,
) -> Result<ItemDetail, ApiError> {
    let (collection, item) = find_in_collection(store, collection_id, item_id).await?;
    if item.hidden && !can_view_hidden(actor, collection.collection.author_id) {
        return Err(ApiError::not_found("Item not found"));
    }
    detail(store, item).await
}

pub async fn all_visible(store: &dyn Store) -> Result<Vec<ItemSummary>, ApiError> {
    Ok(store.list_visible_items().await?)
}

/// Admin view of a collection, hidden items included
pub async fn list_all_in_collection(store: &dyn Store, collection_id: i32) -> Result<Vec<Item>, ApiError> {
    collections::find(store, collection_id).await?;
    Ok(store.list_items(collection_id, true).await?)
}
