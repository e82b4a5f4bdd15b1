//! User sessions.

mod context;
mod store;

pub use context::Session;
pub use store::SessionStore;
