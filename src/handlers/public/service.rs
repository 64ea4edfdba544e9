// handlers/public/service.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::DatabaseManager;
use crate::error::ApiError;

pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "endpoints": {
                "auth": ["POST /auth/signup", "POST /auth/login"],
                "collections": [
                    "GET /collections",
                    "GET /collections/biggest",
                    "GET /collections/users-collection/:user_id",
                    "GET /collections/:collection_id",
                    "POST /collections",
                    "PATCH /collections/:collection_id",
                    "DELETE /collections/:collection_id"
                ],
                "items": [
                    "GET /allItems",
                    "GET /collections/:collection_id/items",
                    "GET /collections/:collection_id/items/:item_id",
                    "POST /collections/:collection_id/items",
                    "PATCH /collections/:collection_id/items/:item_id",
                    "DELETE /collections/:collection_id/items/:item_id"
                ],
                "admin": [
                    "GET /admin/users",
                    "GET /admin/users/:user_id",
                    "PATCH /admin/users/:user_id/block",
                    "PATCH /admin/users/:user_id/unblock",
                    "PATCH /admin/users/:user_id/addAdmin",
                    "PATCH /admin/users/:user_id/removeAdmin",
                    "DELETE /admin/users/:user_id",
                    "GET /admin/collections/:collection_id/items"
                ]
            }
        }
    }))
}

/// 200 when the database answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let Some(pool) = &state.pool else {
        return (
            StatusCode::OK,
            Json(json!({ "success": true, "data": { "status": "ok", "database": "not configured" } })),
        )
            .into_response();
    };

    match DatabaseManager::health_check(pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": { "status": "ok", "database": "up" } })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            ApiError::service_unavailable("Database unavailable").into_response()
        }
    }
}
