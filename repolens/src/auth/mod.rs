//! GitHub authentication.

mod credential;
mod oauth;

pub use credential::Credential;
pub use oauth::{CallbackParams, OAuthClient};
