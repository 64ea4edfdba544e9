use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::{permission, session, AuthenticatedUser};

/// Caller that presented a valid, non-blocked credential
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

/// Caller that may be anonymous. A credential that is present must still be valid.
#[derive(Clone, Debug)]
pub struct MaybeAuthUser(pub Option<AuthenticatedUser>);

impl MaybeAuthUser {
    pub fn actor(&self) -> Option<&AuthenticatedUser> {
        self.0.as_ref()
    }
}

fn authorization(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    headers
        .get(AUTHORIZATION)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))
        })
        .transpose()
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Already resolved by require_admin
        if let Some(actor) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(AuthUser(actor.clone()));
        }

        let header = authorization(&parts.headers)?;
        let actor = session::resolve(state.store.as_ref(), &state.keys, header).await?;
        Ok(AuthUser(actor))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = authorization(&parts.headers)?;
        let actor = session::resolve_optional(state.store.as_ref(), &state.keys, header).await?;
        Ok(MaybeAuthUser(actor))
    }
}

/// Route layer for `/admin/*`: resolve the caller and require the Admin role.
/// The resolved user is left in request extensions for handlers.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = authorization(request.headers())?;
    let actor = session::resolve(state.store.as_ref(), &state.keys, header).await?;
    permission::ensure_admin(&actor)?;

    tracing::debug!("Admin {} on {}", actor.user.username, request.uri().path());
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}
