use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::TokenKeys;
use crate::config::{AppConfig, PaginationConfig};
use crate::database::models::Page;
use crate::database::Store;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{rate_limit, require_admin};
use crate::services::FixedWindowLimiter;

/// Shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub keys: TokenKeys,
    pub limiter: Option<Arc<FixedWindowLimiter>>,
    pub pagination: PaginationConfig,
    pub bcrypt_cost: u32,
    /// Pool behind `store`, when there is one, for health checks
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        let limiter = config.api.enable_rate_limiting.then(|| {
            Arc::new(FixedWindowLimiter::new(
                config.api.rate_limit_requests,
                Duration::from_secs(config.api.rate_limit_window_secs),
            ))
        });

        Self {
            store,
            keys: TokenKeys::new(
                config.security.jwt_secret.clone(),
                config.security.jwt_expiry_hours,
            ),
            limiter,
            pagination: config.pagination.clone(),
            bcrypt_cost: config.security.bcrypt_cost,
            pool: None,
        }
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_limiter(mut self, limiter: Option<Arc<FixedWindowLimiter>>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn page(&self, page: Option<i64>, limit: Option<i64>) -> Page {
        Page::new(
            page,
            limit,
            self.pagination.default_limit,
            self.pagination.max_limit,
        )
    }
}

/// Empty origin list means any origin
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn app(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(public::service::root))
        .route("/health", get(public::service::health))
        .merge(auth_routes())
        .merge(collection_routes())
        .merge(item_routes())
        .merge(admin_routes(state.clone()))
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
}

fn collection_routes() -> Router<AppState> {
    use protected::collections as write;
    use public::collections as read;

    Router::new()
        .route("/collections", get(read::list).post(write::create))
        .route("/collections/biggest", get(read::biggest))
        .route("/collections/users-collection/:user_id", get(read::by_user))
        .route(
            "/collections/:collection_id",
            get(read::show).patch(write::update).delete(write::delete),
        )
}

fn item_routes() -> Router<AppState> {
    use protected::items as write;
    use public::items as read;

    Router::new()
        .route("/allItems", get(read::all))
        .route(
            "/collections/:collection_id/items",
            get(read::list).post(write::create),
        )
        .route(
            "/collections/:collection_id/items/:item_id",
            get(read::show).patch(write::update).delete(write::delete),
        )
}

fn admin_routes(state: AppState) -> Router<AppState> {
    use elevated::{collections, users};

    Router::new()
        .route("/admin/users", get(users::list))
        .route("/admin/users/:user_id", get(users::show).delete(users::delete))
        .route("/admin/users/:user_id/block", patch(users::block))
        .route("/admin/users/:user_id/unblock", patch(users::unblock))
        .route("/admin/users/:user_id/addAdmin", patch(users::add_admin))
        .route("/admin/users/:user_id/removeAdmin", patch(users::remove_admin))
        .route(
            "/admin/collections/:collection_id/items",
            get(collections::list_items),
        )
        .route_layer(from_fn_with_state(state, require_admin))
}
