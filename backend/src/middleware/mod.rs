//! Request middleware and extractors

pub mod auth;
pub mod validation;

pub use auth::{auth_middleware, AuthUser, CurrentUser};
pub use validation::{JsonBody, Path, Query, ValidatedJson};
