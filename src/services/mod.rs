pub mod accounts;
pub mod admin;
pub mod collections;
pub mod fields;
pub mod input;
pub mod items;
pub mod permission;
pub mod rate_limit;
pub mod session;

pub use rate_limit::{FixedWindowLimiter, RateLimitError};
pub use session::AuthenticatedUser;
