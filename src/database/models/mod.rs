pub mod collection;
pub mod item;
pub mod item_field;
pub mod role;
pub mod tag;
pub mod user;

pub use collection::{Collection, CollectionChanges, CollectionRanking, CollectionWithOwner, NewCollection, Theme};
pub use item::{Item, ItemChanges, ItemFieldValue, ItemSummary, NewItem};
pub use item_field::{FieldType, ItemField, NewItemField};
pub use role::{Role, ROLE_ADMIN, ROLE_USER};
pub use tag::Tag;
pub use user::{Language, NewUser, UiTheme, User, UserStatus};

use thiserror::Error;

/// A text column held a value outside of its enum domain
#[derive(Debug, Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Limit/offset window derived from `page` and `limit` query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Pages are 1-based. Out-of-range input is clamped instead of rejected.
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64, max_limit: i64) -> Self {
        let limit = limit.unwrap_or(default_limit).clamp(1, max_limit.max(1));
        let page = page.unwrap_or(1).max(1);
        Self {
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }
}
