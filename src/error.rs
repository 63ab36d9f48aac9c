//! # Crate Error Types
//!
//! Top-level error wrapping every subsystem error so callers that drive the
//! whole pipeline (the CLI, scheduled jobs) can use a single `Result`.

use crate::auth::TokenError;
use crate::callback::CallbackError;
use crate::config::ConfigurationError;
use crate::http::HttpError;
use crate::messaging::MessagingError;
use crate::proxy::ProxyError;
use crate::source::SourceError;
use crate::worker::WorkerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AhjoSyncError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Messaging(#[from] MessagingError),

    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error(transparent)]
    Callback(#[from] CallbackError),
}

pub type Result<T> = std::result::Result<T, AhjoSyncError>;
