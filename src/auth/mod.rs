//! # Ahjo Authentication
//!
//! OAuth2 token lifecycle for the Ahjo API and the collaborators it relies
//! on: a durable token store and a named lock service.

pub mod error;
pub mod lock;
pub mod manager;
pub mod settings;
pub mod store;
pub mod token;

pub use error::{TokenError, TokenResult};
pub use lock::{FileLockService, InMemoryLockService, LockService};
pub use manager::TokenManager;
pub use settings::AuthSettings;
pub use store::{FileTokenStore, InMemoryTokenStore, TokenStore};
pub use token::AuthToken;
