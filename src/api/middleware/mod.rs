pub mod owner_token;

pub use owner_token::{OwnerToken, TOKEN_COOKIE, TokenKey, owner_token};
