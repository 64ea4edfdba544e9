use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

use crate::app::AppState;
use crate::error::ApiError;

/// Admission control ahead of every route, keyed by client IP.
/// Without connection info (e.g. in-process tests) all callers share one bucket.
pub async fn rate_limit(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(limiter) = &state.limiter {
        let client = connect_info
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        if let Err(e) = limiter.check(&client) {
            tracing::warn!("Rate limit exceeded for {}", client);
            return Err(e.into());
        }
    }

    Ok(next.run(request).await)
}
