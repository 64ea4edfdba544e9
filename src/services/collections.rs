use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::database::models::{
    Collection, CollectionChanges, CollectionRanking, CollectionWithOwner, ItemField,
    NewCollection, NewItemField, Page, Theme,
};
use crate::database::Store;
use crate::error::ApiError;

use super::input::{Checks, MAX_TEXT_LENGTH};
use super::permission::ensure_can_act;
use super::session::AuthenticatedUser;

/// Field definitions beyond this count are dropped, not rejected
pub const MAX_ITEM_FIELDS: usize = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCollection {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub theme: Theme,
    #[serde(default, rename = "imageURL", alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default, rename = "itemFields")]
    pub item_fields: Vec<NewItemField>,
}

/// Field definitions are fixed at creation and cannot be changed here
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCollection {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default, rename = "imageURL", alias = "imageUrl")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDetail {
    #[serde(flatten)]
    pub collection: CollectionWithOwner,
    pub item_fields: Vec<ItemField>,
}

pub async fn find(store: &dyn Store, collection_id: i32) -> Result<CollectionWithOwner, ApiError> {
    store
        .find_collection(collection_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Collection not found"))
}

pub async fn get(store: &dyn Store, collection_id: i32) -> Result<CollectionDetail, ApiError> {
    let collection = find(store, collection_id).await?;
    let item_fields = store.item_fields(collection_id).await?;
    Ok(CollectionDetail {
        collection,
        item_fields,
    })
}

pub async fn list(store: &dyn Store, page: Page) -> Result<Vec<Collection>, ApiError> {
    Ok(store.list_collections(page).await?)
}

pub async fn biggest(store: &dyn Store) -> Result<Vec<CollectionRanking>, ApiError> {
    Ok(store.collections_by_item_count().await?)
}

pub async fn user_collections(
    store: &dyn Store,
    user_id: i32,
    page: Page,
) -> Result<Vec<Collection>, ApiError> {
    store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(store.list_user_collections(user_id, page).await?)
}

/// Field names must be present and unique within one collection
fn check_field_definitions(fields: &[NewItemField]) -> Result<(), ApiError> {
    let mut seen = HashSet::new();
    for field in fields {
        let name = field.field_name.trim();
        if name.is_empty() {
            return Err(ApiError::bad_request("Field name cannot be empty"));
        }
        if !seen.insert(name) {
            return Err(ApiError::bad_request(format!("Duplicate field name: {}", name)));
        }
    }
    Ok(())
}

pub async fn create(
    store: &dyn Store,
    actor: &AuthenticatedUser,
    input: CreateCollection,
) -> Result<CollectionDetail, ApiError> {
    let keep_fields = input.item_fields.len() <= MAX_ITEM_FIELDS;

    let mut checks = Checks::new();
    checks.not_blank("title", &input.title, "Title is required");
    checks.max_len("title", input.title.trim(), MAX_TEXT_LENGTH);
    checks.image_url("imageURL", input.image_url.as_deref());
    if keep_fields {
        for (i, field) in input.item_fields.iter().enumerate() {
            checks.max_len(
                &format!("itemFields[{}].fieldName", i),
                field.field_name.trim(),
                MAX_TEXT_LENGTH,
            );
        }
    }
    checks.finish("Invalid collection data")?;

    if keep_fields {
        check_field_definitions(&input.item_fields)?;
    } else {
        tracing::info!(
            "Ignoring {} field definitions for new collection '{}' (max {})",
            input.item_fields.len(),
            input.title,
            MAX_ITEM_FIELDS
        );
    }

    let collection = store
        .insert_collection(NewCollection {
            title: input.title.trim().to_string(),
            description: input.description,
            theme: input.theme,
            image_url: input.image_url,
            author_id: actor.user_id(),
        })
        .await?;

    let fields: Vec<NewItemField> = if keep_fields {
        input
            .item_fields
            .into_iter()
            .map(|field| NewItemField {
                field_name: field.field_name.trim().to_string(),
                field_type: field.field_type,
            })
            .collect()
    } else {
        Vec::new()
    };
    let item_fields = store
        .insert_item_fields(collection.collection_id, &fields)
        .await?;

    tracing::info!(
        "User {} created collection {} with {} fields",
        actor.user_id(),
        collection.collection_id,
        item_fields.len()
    );

    Ok(CollectionDetail {
        collection: CollectionWithOwner {
            collection,
            owner_username: actor.user.username.clone(),
        },
        item_fields,
    })
}

pub async fn update(
    store: &dyn Store,
    actor: &AuthenticatedUser,
    collection_id: i32,
    input: UpdateCollection,
) -> Result<CollectionDetail, ApiError> {
    let existing = find(store, collection_id).await?;
    ensure_can_act(
        actor,
        existing.collection.author_id,
        "You have to be the owner of the collection to update it",
    )?;

    let mut checks = Checks::new();
    if let Some(title) = &input.title {
        checks.not_blank("title", title, "Title is required");
        checks.max_len("title", title.trim(), MAX_TEXT_LENGTH);
    }
    checks.image_url("imageURL", input.image_url.as_deref());
    checks.finish("Invalid collection data")?;

    store
        .update_collection(
            collection_id,
            CollectionChanges {
                title: input.title.map(|title| title.trim().to_string()),
                description: input.description,
                theme: input.theme,
                image_url: input.image_url,
            },
        )
        .await?;

    get(store, collection_id).await
}

pub async fn delete(
    store: &dyn Store,
    actor: &AuthenticatedUser,
    collection_id: i32,
) -> Result<(), ApiError> {
    let existing = find(store, collection_id).await?;
    ensure_can_act(
        actor,
        existing.collection.author_id,
        "You have to be the owner of the collection to delete it",
    )?;

    store.delete_collection(collection_id).await?;
    tracing::info!("User {} deleted collection {}", actor.user_id(), collection_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::FieldType;
    use crate::testing::{fixtures, MemoryStore};

    fn field(name: &str, field_type: FieldType) -> NewItemField {
        NewItemField {
            field_name: name.to_string(),
            field_type,
        }
    }

    fn coins(item_fields: Vec<NewItemField>) -> CreateCollection {
        CreateCollection {
            title: "Roman coins".to_string(),
            description: Some("Denarii mostly".to_string()),
            theme: Theme::Coins,
            image_url: None,
            item_fields,
        }
    }

    fn all() -> Page {
        Page::new(None, None, 20, 100)
    }

    #[tokio::test]
    async fn three_fields_are_persisted() {
        let store = MemoryStore::seeded();
        let alice = fixtures::signed_in(&store, "alice", &[]).await;
        let fields = vec![
            field("year", FieldType::Integer),
            field("mint", FieldType::String),
            field("graded", FieldType::Boolean),
        ];

        let detail = create(&store, &alice, coins(fields)).await.unwrap();
        assert_eq!(detail.item_fields.len(), 3);
        assert_eq!(detail.collection.owner_username, "alice");
        assert_eq!(store.field_count(), 3);
    }

    #[tokio::test]
    async fn more_than_three_fields_are_dropped() {
        let store = MemoryStore::seeded();
        let alice = fixtures::signed_in(&store, "alice", &[]).await;
        let fields = (0..4).map(|i| field(&format!("f{i}"), FieldType::Text)).collect();

        let detail = create(&store, &alice, coins(fields)).await.unwrap();
        assert!(detail.item_fields.is_empty());
        assert_eq!(store.field_count(), 0);
        assert_eq!(list(&store, all()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_field_names_are_rejected_before_insert() {
        let store = MemoryStore::seeded();
        let alice = fixtures::signed_in(&store, "alice", &[]).await;
        let fields = vec![field("year", FieldType::Integer), field(" year ", FieldType::Date)];

        let err = create(&store, &alice, coins(fields)).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg == "Duplicate field name: year"));
        assert!(list(&store, all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn overlong_text_is_rejected_before_insert() {
        let store = MemoryStore::seeded();
        let alice = fixtures::signed_in(&store, "alice", &[]).await;
        let mut input = coins(vec![field(&"n".repeat(300), FieldType::Text)]);
        input.title = "x".repeat(300);
        input.image_url = Some(format!("https://cdn.example.com/a.png?sig={}", "s".repeat(300)));

        let err = create(&store, &alice, input).await.unwrap_err();
        let ApiError::ValidationError { errors, .. } = err else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["title", "imageURL", "itemFields[0].fieldName"]);
        assert!(list(&store, all()).await.unwrap().is_empty());
        assert_eq!(store.field_count(), 0);
    }

    #[tokio::test]
    async fn overlong_title_on_update_is_rejected() {
        let store = MemoryStore::seeded();
        let alice = fixtures::signed_in(&store, "alice", &[]).await;
        let id = create(&store, &alice, coins(vec![])).await.unwrap().collection.collection.collection_id;

        let update_input = UpdateCollection {
            title: Some("x".repeat(256)),
            ..Default::default()
        };
        let err = update(&store, &alice, id, update_input).await.unwrap_err();
        assert!(matches!(err, ApiError::ValidationError { .. }));
        assert_eq!(get(&store, id).await.unwrap().collection.collection.title, "Roman coins");
    }

    #[tokio::test]
    async fn blank_title_is_a_validation_error() {
        let store = MemoryStore::seeded();
        let alice = fixtures::signed_in(&store, "alice", &[]).await;
        let mut input = coins(vec![]);
        input.title = "  ".to_string();
        input.image_url = Some("nope".to_string());

        let err = create(&store, &alice, input).await.unwrap_err();
        assert!(matches!(err, ApiError::ValidationError { ref errors, .. } if errors.len() == 2));
    }

    #[tokio::test]
    async fn only_owner_or_admin_may_update() {
        let store = MemoryStore::seeded();
        let alice = fixtures::signed_in(&store, "alice", &[]).await;
        let bob = fixtures::signed_in(&store, "bob", &[]).await;
        let root = fixtures::signed_in(&store, "root", &["Admin"]).await;
        let id = create(&store, &alice, coins(vec![])).await.unwrap().collection.collection.collection_id;

        let rename = |title: &str| UpdateCollection {
            title: Some(title.to_string()),
            ..Default::default()
        };

        let err = update(&store, &bob, id, rename("Mine now")).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let updated = update(&store, &root, id, rename("Greek coins")).await.unwrap();
        assert_eq!(updated.collection.collection.title, "Greek coins");
        assert_eq!(updated.collection.collection.description.as_deref(), Some("Denarii mostly"));
    }

    #[tokio::test]
    async fn delete_checks_ownership_and_existence() {
        let store = MemoryStore::seeded();
        let alice = fixtures::signed_in(&store, "alice", &[]).await;
        let bob = fixtures::signed_in(&store, "bob", &[]).await;
        let id = create(&store, &alice, coins(vec![field("year", FieldType::Integer)]))
            .await
            .unwrap()
            .collection
            .collection
            .collection_id;

        assert!(matches!(delete(&store, &bob, id).await, Err(ApiError::Forbidden(_))));
        delete(&store, &alice, id).await.unwrap();
        assert_eq!(store.field_count(), 0);
        assert!(matches!(delete(&store, &alice, id).await, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn user_collections_requires_existing_user() {
        let store = MemoryStore::seeded();
        let alice = fixtures::signed_in(&store, "alice", &[]).await;
        create(&store, &alice, coins(vec![])).await.unwrap();

        assert_eq!(user_collections(&store, alice.user_id(), all()).await.unwrap().len(), 1);
        assert!(matches!(
            user_collections(&store, 9999, all()).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_paginated() {
        let store = MemoryStore::seeded();
        let alice = fixtures::signed_in(&store, "alice", &[]).await;
        for title in ["first", "second", "third"] {
            let mut input = coins(vec![]);
            input.title = title.to_string();
            create(&store, &alice, input).await.unwrap();
        }

        let page = list(&store, Page::new(Some(1), Some(2), 20, 100)).await.unwrap();
        let titles: Vec<_> = page.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["third", "second"]);

        let page = list(&store, Page::new(Some(2), Some(2), 20, 100)).await.unwrap();
        assert_eq!(page[0].title, "first");
    }
}
