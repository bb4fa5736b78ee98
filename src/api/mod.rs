//! HTTP layer: owner-token middleware, handlers and error mapping

pub mod error;
pub mod middleware;
pub mod services;

pub use middleware::{OwnerToken, TokenKey, owner_token};
pub use services::shortener_routes;
