// handlers/protected/collections.rs - Collection writes
//
// POST   /collections
// PATCH  /collections/:collection_id
// DELETE /collections/:collection_id

use axum::extract::State;
use serde_json::Value;

use crate::app::AppState;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::collections::{self, CollectionDetail, CreateCollection, UpdateCollection};

pub async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(body): ApiJson<CreateCollection>,
) -> ApiResult<CollectionDetail> {
    let detail = collections::create(state.store.as_ref(), &actor, body).await?;
    Ok(ApiResponse::created(detail))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(collection_id): ApiPath<i32>,
    ApiJson(body): ApiJson<UpdateCollection>,
) -> ApiResult<CollectionDetail> {
    let detail = collections::update(state.store.as_ref(), &actor, collection_id, body).await?;
    Ok(ApiResponse::success(detail))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(collection_id): ApiPath<i32>,
) -> ApiResult<Value> {
    collections::delete(state.store.as_ref(), &actor, collection_id).await?;
    Ok(ApiResponse::message("Collection deleted successfully"))
}
