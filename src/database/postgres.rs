use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};

use super::models::{
    Collection, CollectionChanges, CollectionRanking, CollectionWithOwner, Item, ItemChanges,
    ItemField, ItemFieldValue, ItemSummary, NewCollection, NewItem, NewItemField, NewUser, Page,
    Role, Tag, User, UserStatus,
};
use super::manager::DatabaseError;
use super::store::{Store, StoreResult};

/// Surface unique-constraint failures (SQLSTATE 23505) as `Duplicate`
fn unique_violation(err: sqlx::Error) -> DatabaseError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DatabaseError::Duplicate(db.constraint().unwrap_or("unique constraint").to_string())
        }
        other => DatabaseError::Sqlx(other),
    }
}

/// `Store` backed by PostgreSQL; cascades are enforced by the schema's
/// `ON DELETE CASCADE` foreign keys.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

const COLLECTION_WITH_OWNER: &str = r#"
    SELECT c.*, u.username AS owner_username
    FROM collections c
    JOIN users u ON u.user_id = c.author_id
"#;

#[async_trait]
impl Store for PgStore {
    async fn find_user(&self, user_id: i32) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password, last_action)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.last_action)
        .fetch_one(&self.pool)
        .await
        .map_err(unique_violation)?;
        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY user_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn set_user_status(&self, user_id: i32, status: UserStatus) -> StoreResult<()> {
        sqlx::query("UPDATE users SET status = $2, updated_at = NOW() WHERE user_id = $1")
            .bind(user_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn touch_last_action(&self, user_id: i32, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_action = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_user(&self, user_id: i32) -> StoreResult<()> {
        sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_role_by_name(&self, role_name: &str) -> StoreResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE role_name = $1")
            .bind(role_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    async fn user_roles(&self, user_id: i32) -> StoreResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.role_id, r.role_name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.role_id
            WHERE ur.user_id = $1
            ORDER BY r.role_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    async fn user_has_role(&self, user_id: i32, role_id: i32) -> StoreResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM user_roles WHERE user_id = $1 AND role_id = $2)",
        )
        .bind(user_id)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn add_user_role(&self, user_id: i32, role_id: i32) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT (user_id, role_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_user_role(&self, user_id: i32, role_id: i32) -> StoreResult<()> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_collection(&self, collection: NewCollection) -> StoreResult<Collection> {
        let collection = sqlx::query_as::<_, Collection>(
            r#"
            INSERT INTO collections (title, description, theme, image_url, author_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&collection.title)
        .bind(&collection.description)
        .bind(collection.theme.as_str())
        .bind(&collection.image_url)
        .bind(collection.author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(collection)
    }

    async fn find_collection(&self, collection_id: i32) -> StoreResult<Option<CollectionWithOwner>> {
        let sql = format!("{} WHERE c.collection_id = $1", COLLECTION_WITH_OWNER);
        let collection = sqlx::query_as::<_, CollectionWithOwner>(&sql)
            .bind(collection_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(collection)
    }

    async fn list_collections(&self, page: Page) -> StoreResult<Vec<Collection>> {
        let collections = sqlx::query_as::<_, Collection>(
            "SELECT * FROM collections ORDER BY created_at DESC, collection_id DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(collections)
    }

    async fn list_user_collections(&self, author_id: i32, page: Page) -> StoreResult<Vec<Collection>> {
        let collections = sqlx::query_as::<_, Collection>(
            r#"
            SELECT * FROM collections
            WHERE author_id = $1
            ORDER BY created_at DESC, collection_id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(author_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(collections)
    }

    async fn collections_by_item_count(&self) -> StoreResult<Vec<CollectionRanking>> {
        let rankings = sqlx::query_as::<_, CollectionRanking>(
            r#"
            SELECT c.*, u.username AS owner_username, COUNT(i.item_id) AS item_amount
            FROM collections c
            JOIN users u ON u.user_id = c.author_id
            LEFT JOIN items i ON i.collection_id = c.collection_id
            GROUP BY c.collection_id, u.username
            ORDER BY item_amount DESC, c.created_at DESC, c.collection_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rankings)
    }

    async fn update_collection(&self, collection_id: i32, changes: CollectionChanges) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE collections SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                theme = COALESCE($4, theme),
                image_url = COALESCE($5, image_url),
                updated_at = NOW()
            WHERE collection_id = $1
            "#,
        )
        .bind(collection_id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.theme.map(|theme| theme.as_str()))
        .bind(changes.image_url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_collection(&self, collection_id: i32) -> StoreResult<()> {
        sqlx::query("DELETE FROM collections WHERE collection_id = $1")
            .bind(collection_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_item_fields(
        &self,
        collection_id: i32,
        fields: &[NewItemField],
    ) -> StoreResult<Vec<ItemField>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO item_fields (collection_id, field_name, field_type) ");
        builder.push_values(fields, |mut row, field| {
            row.push_bind(collection_id)
                .push_bind(field.field_name.clone())
                .push_bind(field.field_type.as_str());
        });
        builder.push(" RETURNING *");

        let mut inserted = builder
            .build_query_as::<ItemField>()
            .fetch_all(&self.pool)
            .await?;
        inserted.sort_by_key(|field| field.field_id);
        Ok(inserted)
    }

    async fn item_fields(&self, collection_id: i32) -> StoreResult<Vec<ItemField>> {
        let fields = sqlx::query_as::<_, ItemField>(
            "SELECT * FROM item_fields WHERE collection_id = $1 ORDER BY field_id",
        )
        .bind(collection_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(fields)
    }

    async fn insert_item(&self, item: NewItem) -> StoreResult<Item> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (collection_id, title, hidden, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(item.collection_id)
        .bind(&item.title)
        .bind(item.hidden)
        .bind(&item.image_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    async fn find_item(&self, item_id: i32) -> StoreResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE item_id = $1")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn list_items(&self, collection_id: i32, include_hidden: bool) -> StoreResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT * FROM items
            WHERE collection_id = $1 AND ($2 OR hidden = FALSE)
            ORDER BY created_at DESC, item_id DESC
            "#,
        )
        .bind(collection_id)
        .bind(include_hidden)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn list_visible_items(&self) -> StoreResult<Vec<ItemSummary>> {
        let items = sqlx::query_as::<_, ItemSummary>(
            r#"
            SELECT i.*, c.title AS collection_title, u.username AS owner_username
            FROM items i
            JOIN collections c ON c.collection_id = i.collection_id
            JOIN users u ON u.user_id = c.author_id
            WHERE i.hidden = FALSE
            ORDER BY i.created_at DESC, i.item_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn update_item(&self, item_id: i32, changes: ItemChanges) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE items SET
                title = COALESCE($2, title),
                hidden = COALESCE($3, hidden),
                image_url = COALESCE($4, image_url),
                updated_at = NOW()
            WHERE item_id = $1
            "#,
        )
        .bind(item_id)
        .bind(changes.title)
        .bind(changes.hidden)
        .bind(changes.image_url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_item(&self, item_id: i32) -> StoreResult<()> {
        sqlx::query("DELETE FROM items WHERE item_id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_field_value(&self, item_id: i32, field_id: i32, value: Value) -> StoreResult<()> {
        sqlx::query("INSERT INTO item_field_values (item_id, field_id, value) VALUES ($1, $2, $3)")
            .bind(item_id)
            .bind(field_id)
            .bind(Json(value))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_field_value(&self, item_id: i32, field_id: i32, value: Value) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO item_field_values (item_id, field_id, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (item_id, field_id) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(item_id)
        .bind(field_id)
        .bind(Json(value))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn item_field_values(&self, item_id: i32) -> StoreResult<Vec<ItemFieldValue>> {
        let values = sqlx::query_as::<_, ItemFieldValue>(
            "SELECT * FROM item_field_values WHERE item_id = $1 ORDER BY field_id",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(values)
    }

    async fn find_or_create_tag(&self, tag_name: &str) -> StoreResult<Tag> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (tag_name) VALUES ($1)
            ON CONFLICT (tag_name) DO UPDATE SET tag_name = EXCLUDED.tag_name
            RETURNING *
            "#,
        )
        .bind(tag_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(tag)
    }

    async fn clear_item_tags(&self, item_id: i32) -> StoreResult<()> {
        sqlx::query("DELETE FROM item_tags WHERE item_id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn link_item_tag(&self, item_id: i32, tag_id: i32) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO item_tags (item_id, tag_id) VALUES ($1, $2) ON CONFLICT (item_id, tag_id) DO NOTHING",
        )
        .bind(item_id)
        .bind(tag_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn item_tags(&self, item_id: i32) -> StoreResult<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.*
            FROM tags t
            JOIN item_tags it ON it.tag_id = t.tag_id
            WHERE it.item_id = $1
            ORDER BY it.id
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }
}
