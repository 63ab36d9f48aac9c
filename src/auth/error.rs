//! # Token Error Types
//!
//! Failures of the token lifecycle. They are surfaced to the caller of a
//! refresh and never retried by the token manager itself.

use crate::http::HttpError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Ahjo authentication settings are incomplete: missing {missing:?}")]
    NotConfigured { missing: Vec<&'static str> },

    #[error("Token refresh already in progress: lock '{lock_name}' is held")]
    LockUnavailable { lock_name: String },

    #[error("No refresh token stored for environment '{environment}'")]
    MissingRefreshToken { environment: String },

    #[error("Token request transport failure: {0}")]
    Transport(#[from] HttpError),

    #[error("Token endpoint responded with HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Malformed token response: {message} (body: {body})")]
    MalformedResponse { message: String, body: String },

    #[error("Failed to parse stored token: {message}")]
    Parse { message: String },

    #[error("Token store failure: {message}")]
    Store { message: String },

    #[error("Lock service failure: {message}")]
    Lock { message: String },
}

impl TokenError {
    pub fn not_configured(missing: Vec<&'static str>) -> Self {
        Self::NotConfigured { missing }
    }

    pub fn lock_unavailable(lock_name: impl Into<String>) -> Self {
        Self::LockUnavailable {
            lock_name: lock_name.into(),
        }
    }

    pub fn missing_refresh_token(environment: impl Into<String>) -> Self {
        Self::MissingRefreshToken {
            environment: environment.into(),
        }
    }

    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    pub fn malformed_response(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
            body: body.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn lock(message: impl Into<String>) -> Self {
        Self::Lock {
            message: message.into(),
        }
    }
}

pub type TokenResult<T> = Result<T, TokenError>;
