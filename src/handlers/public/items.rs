// handlers/public/items.rs - Item reads
//
// Listing and lookup take an optional credential: hidden items are only
// returned to the collection owner or an admin.

use axum::extract::State;

use crate::app::AppState;
use crate::database::models::{Item, ItemSummary};
use crate::middleware::{ApiPath, ApiResponse, ApiResult, MaybeAuthUser};
use crate::services::items::{self, ItemDetail};

/// GET /collections/:collection_id/items
pub async fn list(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    ApiPath(collection_id): ApiPath<i32>,
) -> ApiResult<Vec<Item>> {
    let rows = items::list(state.store.as_ref(), caller.actor(), collection_id).await?;
    Ok(ApiResponse::success(rows))
}

/// GET /collections/:collection_id/items/:item_id
pub async fn show(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    ApiPath((collection_id, item_id)): ApiPath<(i32, i32)>,
) -> ApiResult<ItemDetail> {
    let detail = items::get(state.store.as_ref(), caller.actor(), collection_id, item_id).await?;
    Ok(ApiResponse::success(detail))
}

/// GET /allItems
pub async fn all(State(state): State<AppState>) -> ApiResult<Vec<ItemSummary>> {
    let rows = items::all_visible(state.store.as_ref()).await?;
    Ok(ApiResponse::success(rows))
}
