//! # Worker Error Types
//!
//! Failure classes a queue worker can raise while processing one item.
//! Rerouting is a regular outcome, not an error.

use crate::messaging::MessagingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    /// Upstream is down; the whole queue pauses until the next scheduled run
    #[error("Queue {queue} suspended: {reason}")]
    Suspend { queue: String, reason: String },

    /// Item not yet expired; the backend redelivers it unchanged
    #[error("Item {entity_id} in {queue} will be retried: {reason}")]
    Retryable {
        queue: String,
        entity_id: String,
        reason: String,
    },

    /// No further home for the item; must surface to the operator
    #[error("Fatal failure for item {entity_id} in {queue}: {reason}")]
    Fatal {
        queue: String,
        entity_id: String,
        reason: String,
    },

    #[error("Queue backend failure: {0}")]
    Backend(#[from] MessagingError),
}

impl WorkerError {
    pub fn suspend(queue: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Suspend {
            queue: queue.into(),
            reason: reason.into(),
        }
    }

    pub fn retryable(
        queue: impl Into<String>,
        entity_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Retryable {
            queue: queue.into(),
            entity_id: entity_id.into(),
            reason: reason.into(),
        }
    }

    pub fn fatal(
        queue: impl Into<String>,
        entity_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Fatal {
            queue: queue.into(),
            entity_id: entity_id.into(),
            reason: reason.into(),
        }
    }

    pub fn is_suspend(&self) -> bool {
        matches!(self, Self::Suspend { .. })
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable { .. })
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. } | Self::Backend(_))
    }
}
