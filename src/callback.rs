//! # Callback Intake
//!
//! Ahjo notifies subscribers about changed content with a small JSON body per
//! entity. Each notification becomes one item in the subscriber queue.

use crate::constants::queues;
use crate::logging::log_queue_operation;
use crate::proxy::{ProxyError, ProxyService};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Body of an Ahjo callback notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackPayload {
    pub id: String,
    pub updatetype: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Enqueued { item_id: String },
    AlreadyQueued,
}

#[derive(Error, Debug)]
pub enum CallbackError {
    #[error("Invalid callback payload: {message}")]
    InvalidPayload { message: String },

    #[error("Failed to enqueue {endpoint} item {entity_id}")]
    EnqueueFailed { endpoint: String, entity_id: String },

    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

impl CallbackPayload {
    pub fn from_json(body: &str) -> Result<Self, CallbackError> {
        let payload: Self =
            serde_json::from_str(body).map_err(|e| CallbackError::InvalidPayload {
                message: e.to_string(),
            })?;
        payload.validate()?;
        Ok(payload)
    }

    fn validate(&self) -> Result<(), CallbackError> {
        if self.id.trim().is_empty() {
            return Err(CallbackError::InvalidPayload {
                message: "id is empty".to_string(),
            });
        }
        if self.updatetype.trim().is_empty() {
            return Err(CallbackError::InvalidPayload {
                message: "updatetype is empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Queue one notification for `endpoint` unless the subscriber queue already
/// holds the same entity
pub async fn enqueue_callback(
    proxy: &dyn ProxyService,
    endpoint: &str,
    payload: &CallbackPayload,
) -> Result<CallbackOutcome, CallbackError> {
    payload.validate()?;

    if proxy
        .check_if_item_is_already_in_queue(queues::SUBSCRIBER, &payload.id, endpoint)
        .await?
    {
        debug!(endpoint, entity_id = %payload.id, "Callback item already queued");
        log_queue_operation(
            "callback",
            queues::SUBSCRIBER,
            Some(&payload.id),
            Some(endpoint),
            "duplicate",
            Some(&payload.updatetype),
        );
        return Ok(CallbackOutcome::AlreadyQueued);
    }

    let item_id = proxy
        .add_item_to_ahjo_queue(queues::SUBSCRIBER, &payload.id, endpoint, &payload.updatetype)
        .await
        .ok_or_else(|| CallbackError::EnqueueFailed {
            endpoint: endpoint.to_string(),
            entity_id: payload.id.clone(),
        })?;

    Ok(CallbackOutcome::Enqueued { item_id })
}
