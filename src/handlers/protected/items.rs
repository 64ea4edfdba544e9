// handlers/protected/items.rs - Item writes
//
// POST   /collections/:collection_id/items
// PATCH  /collections/:collection_id/items/:item_id
// DELETE /collections/:collection_id/items/:item_id

use axum::extract::State;
use serde_json::Value;

use crate::app::AppState;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::items::{self, CreateItem, ItemDetail, UpdateItem};

pub async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(collection_id): ApiPath<i32>,
    ApiJson(body): ApiJson<CreateItem>,
) -> ApiResult<ItemDetail> {
    let detail = items::create(state.store.as_ref(), &actor, collection_id, body).await?;
    Ok(ApiResponse::created(detail))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath((collection_id, item_id)): ApiPath<(i32, i32)>,
    ApiJson(body): ApiJson<UpdateItem>,
) -> ApiResult<ItemDetail> {
    let detail = items::update(state.store.as_ref(), &actor, collection_id, item_id, body).await?;
    Ok(ApiResponse::success(detail))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath((collection_id, item_id)): ApiPath<(i32, i32)>,
) -> ApiResult<Value> {
    items::delete(state.store.as_ref(), &actor, collection_id, item_id).await?;
    Ok(ApiResponse::message("Item deleted successfully"))
}
