// handlers/mod.rs - Three-tier handler layout
//
// public    - no credential (optional credential for item reads)
// protected - valid credential, ownership checked per resource
// elevated  - Admin role, enforced by a route layer on /admin

pub mod elevated;
pub mod protected;
pub mod public;
