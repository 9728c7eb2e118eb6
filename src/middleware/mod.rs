pub mod auth;

pub use auth::{MaybeIdentity, RequireIdentity};
