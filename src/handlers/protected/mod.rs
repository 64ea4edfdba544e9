// handlers/protected/mod.rs - Handlers that require a credential
//
// Each handler takes an `AuthUser`, so a missing or invalid token is
// rejected before the handler body runs. Ownership is checked in services.

pub mod collections;
pub mod items;
