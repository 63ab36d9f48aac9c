//! # Proxy Error Types

use crate::http::HttpError;
use crate::messaging::MessagingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Ahjo access token unavailable: {reason}")]
    TokenUnavailable { reason: String },

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Ahjo API responded with HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String, body: String },

    #[error("Malformed response body from {url}: {message}")]
    MalformedBody { url: String, message: String },

    #[error(transparent)]
    Messaging(#[from] MessagingError),

    #[error("Collaborator '{collaborator}' failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },
}

impl ProxyError {
    pub fn token_unavailable(reason: impl Into<String>) -> Self {
        Self::TokenUnavailable {
            reason: reason.into(),
        }
    }

    pub fn http_status(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
            body: body.into(),
        }
    }

    pub fn malformed_body(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedBody {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self::Collaborator {
            collaborator,
            message: message.into(),
        }
    }
}

pub type ProxyResult<T> = Result<T, ProxyError>;
