//! # Source Error Types

use crate::proxy::ProxyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    /// The API did not return the pagination metadata iteration relies on
    #[error("Configuration error: {field} missing from response of {url}")]
    MissingMetadata { field: &'static str, url: String },

    #[error("Invalid pagination value for {field} in response of {url}: {message}")]
    InvalidMetadata {
        field: &'static str,
        url: String,
        message: String,
    },

    #[error("Invalid source URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Failed to fetch page: {0}")]
    Fetch(#[from] ProxyError),

    #[error("Failed to enqueue {endpoint} item {entity_id} into {queue}")]
    Enqueue {
        queue: String,
        endpoint: String,
        entity_id: String,
    },
}

impl SourceError {
    pub fn missing_metadata(field: &'static str, url: impl Into<String>) -> Self {
        Self::MissingMetadata {
            field,
            url: url.into(),
        }
    }

    pub fn invalid_metadata(
        field: &'static str,
        url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidMetadata {
            field,
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn enqueue(
        queue: impl Into<String>,
        endpoint: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self::Enqueue {
            queue: queue.into(),
            endpoint: endpoint.into(),
            entity_id: entity_id.into(),
        }
    }

    /// Operator must fix the source definition; retrying will not help
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::MissingMetadata { .. } | Self::InvalidMetadata { .. } | Self::InvalidUrl { .. }
        )
    }
}

pub type SourceResult<T> = Result<T, SourceError>;
