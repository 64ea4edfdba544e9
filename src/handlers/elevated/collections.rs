// handlers/elevated/collections.rs - GET /admin/collections/:collection_id/items

use axum::extract::State;

use crate::app::AppState;
use crate::database::models::Item;
use crate::middleware::{ApiPath, ApiResponse, ApiResult};
use crate::services::items;

/// Every item in the collection, hidden ones included
pub async fn list_items(
    State(state): State<AppState>,
    ApiPath(collection_id): ApiPath<i32>,
) -> ApiResult<Vec<Item>> {
    let rows = items::list_all_in_collection(state.store.as_ref(), collection_id).await?;
    Ok(ApiResponse::success(rows))
}
