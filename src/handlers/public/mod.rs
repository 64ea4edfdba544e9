// handlers/public/mod.rs - Handlers that need no credential
//
// Item reads accept an optional credential so owners and admins also see
// hidden items.

pub mod auth;
pub mod collections;
pub mod items;
pub mod service;
