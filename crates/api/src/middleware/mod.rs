//! Request middleware and extractors.

pub mod auth;
pub mod identity;

pub use auth::{AuthUser, Requester, auth_middleware};
pub use identity::{IdentityProvider, JwtIdentityProvider};
