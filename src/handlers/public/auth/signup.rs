// handlers/public/auth/signup.rs - POST /auth/signup handler

use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::accounts::{self, SignupRequest, TokenResponse};

/// Register a user with the `User` role and return a session token (201)
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> ApiResult<TokenResponse> {
    let token = accounts::signup(state.store.as_ref(), &state.keys, state.bcrypt_cost, body).await?;
    Ok(ApiResponse::created(token))
}
