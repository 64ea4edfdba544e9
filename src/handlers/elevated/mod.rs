// handlers/elevated/mod.rs - Administrative handlers under /admin
//
// Mounted behind the `require_admin` route layer; no handler here checks
// the role itself.

pub mod collections;
pub mod users;
