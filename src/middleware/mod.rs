pub mod auth;
pub mod extract;
pub mod rate_limit;
pub mod response;

pub use auth::{require_admin, AuthUser, MaybeAuthUser};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use rate_limit::rate_limit;
pub use response::{ApiResponse, ApiResult};
