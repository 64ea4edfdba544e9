// handlers/public/auth/mod.rs - Account handlers (no credential required)

pub mod login;
pub mod signup;

pub use login::login;
pub use signup::signup;
