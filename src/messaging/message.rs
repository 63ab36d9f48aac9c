//! # Ahjo Queue Messages
//!
//! Payload of every Ahjo queue item. The shape matches what the callback
//! subscription and the aggregation feed enqueue:
//!
//! ```json
//! {"id": "meetings", "content": {"id": "U5310202300", "updatetype": "Updated"}, "created": 1700000000}
//! ```
//!
//! `content.updatetype` may carry provenance suffixes, one per reroute, of
//! the form `"<update type> - <queue name>"`.

use crate::constants;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AhjoQueueMessage {
    /// Endpoint or content type the entity belongs to, e.g. `meetings`
    pub id: String,
    pub content: MessageContent,
    /// Unix timestamp of the first enqueue; absent on legacy items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    /// Ahjo identifier of the entity
    pub id: String,
    pub updatetype: String,
}

impl AhjoQueueMessage {
    pub fn new(
        endpoint: impl Into<String>,
        entity_id: impl Into<String>,
        update_type: impl Into<String>,
    ) -> Self {
        Self {
            id: endpoint.into(),
            content: MessageContent {
                id: entity_id.into(),
                updatetype: update_type.into(),
            },
            created: None,
        }
    }

    pub fn with_created(mut self, created: i64) -> Self {
        self.created = Some(created);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.id
    }

    pub fn entity_id(&self) -> &str {
        &self.content.id
    }

    pub fn update_type(&self) -> &str {
        &self.content.updatetype
    }

    /// Whether the item has already been rerouted out of `queue`
    pub fn has_passed_through(&self, queue: &str) -> bool {
        self.content
            .updatetype
            .split(constants::PROVENANCE_SEPARATOR)
            .skip(1)
            .any(|segment| segment == queue)
    }

    /// Update type with a provenance suffix naming the queue the item leaves
    pub fn update_type_rerouted_from(&self, queue: &str) -> String {
        format!(
            "{}{}{}",
            self.content.updatetype,
            constants::PROVENANCE_SEPARATOR,
            queue
        )
    }

    /// Meeting updates regenerate motions unless the item already went
    /// through the retry queue
    pub fn requires_motion_reset(&self) -> bool {
        self.id == constants::MEETINGS_ENDPOINT
            && self.content.updatetype.starts_with(constants::UPDATED_PREFIX)
            && !self.has_passed_through(constants::queues::RETRY)
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_json(json: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(json)
    }
}

/// An item handed out by [`QueueBackend::claim_item`](super::QueueBackend::claim_item)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedItem {
    pub item_id: String,
    pub queue: String,
    pub data: AhjoQueueMessage,
    /// When the backend stored the item
    pub enqueued_at: i64,
}
