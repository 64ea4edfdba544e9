// handlers/public/collections.rs - Collection reads
//
// GET /collections
// GET /collections/:collection_id
// GET /collections/biggest
// GET /collections/users-collection/:user_id

use axum::extract::State;
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::{Collection, CollectionRanking};
use crate::middleware::{ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::services::collections::{self, CollectionDetail};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Vec<Collection>> {
    let page = state.page(query.page, query.limit);
    let rows = collections::list(state.store.as_ref(), page).await?;
    Ok(ApiResponse::success(rows))
}

pub async fn show(
    State(state): State<AppState>,
    ApiPath(collection_id): ApiPath<i32>,
) -> ApiResult<CollectionDetail> {
    let detail = collections::get(state.store.as_ref(), collection_id).await?;
    Ok(ApiResponse::success(detail))
}

pub async fn biggest(State(state): State<AppState>) -> ApiResult<Vec<CollectionRanking>> {
    let rows = collections::biggest(state.store.as_ref()).await?;
    Ok(ApiResponse::success(rows))
}

pub async fn by_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i32>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Vec<Collection>> {
    let page = state.page(query.page, query.limit);
    let rows = collections::user_collections(state.store.as_ref(), user_id, page).await?;
    Ok(ApiResponse::success(rows))
}
