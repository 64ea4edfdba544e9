// handlers/public/auth/login.rs - POST /auth/login handler

use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::accounts::{self, LoginRequest, TokenResponse};

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let token = accounts::login(state.store.as_ref(), &state.keys, body).await?;
    Ok(ApiResponse::success(token))
}
