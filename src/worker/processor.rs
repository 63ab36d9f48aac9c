//! # Queue Item Processing
//!
//! One routine shared by every Ahjo queue. Given an item and the queue's
//! [`QueueWorkerConfig`] it either migrates the entity, reroutes the item down
//! the queue chain, or raises a [`WorkerError`] telling the caller what to do
//! with the item.

use super::config::QueueWorkerConfig;
use super::error::WorkerError;
use crate::constants;
use crate::messaging::AhjoQueueMessage;
use crate::proxy::ProxyService;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

/// Successful processing results; every variant means the item can be
/// removed from its current queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Migrated,
    /// Expired item moved to the fallback queue
    Rerouted {
        queue: String,
        item_id: String,
        update_type: String,
    },
    /// Expired item already waiting in the fallback queue
    AlreadyQueued { queue: String },
}

pub async fn process_item(
    proxy: &dyn ProxyService,
    config: &QueueWorkerConfig,
    item: &AhjoQueueMessage,
) -> Result<ItemOutcome, WorkerError> {
    process_item_at(proxy, config, item, Utc::now()).await
}

/// [`process_item`] against an explicit clock
pub async fn process_item_at(
    proxy: &dyn ProxyService,
    config: &QueueWorkerConfig,
    item: &AhjoQueueMessage,
    now: DateTime<Utc>,
) -> Result<ItemOutcome, WorkerError> {
    let queue = config.name.as_str();
    let channel = config.log_channel.as_str();
    let endpoint = item.endpoint();
    let entity_id = item.entity_id();

    if !proxy.is_operational().await {
        warn!(queue, channel, "⏸️ Ahjo API not operational, suspending queue");
        return Err(WorkerError::suspend(queue, "Ahjo API is not operational"));
    }

    let failure = match flag_meeting_motions(proxy, config, item).await {
        Err(reason) => reason,
        Ok(()) => {
            let status = proxy.migrate_single_entity(endpoint, entity_id).await;
            if status == constants::MIGRATION_SUCCESS {
                info!(queue, channel, endpoint, entity_id, "✅ Entity migrated");
                return Ok(ItemOutcome::Migrated);
            }
            warn!(queue, channel, endpoint, entity_id, status, "Migration failed");
            format!("migration returned status {status}")
        }
    };

    if !config.is_expired(item.created, now) {
        return Err(WorkerError::retryable(queue, entity_id, failure));
    }

    let Some(fallback) = config.fallback_queue.as_deref() else {
        error!(queue, channel, endpoint, entity_id, "💥 Expired item on terminal queue");
        return Err(WorkerError::fatal(
            queue,
            entity_id,
            format!("{failure} and no fallback queue exists"),
        ));
    };

    let already_queued = proxy
        .check_if_item_is_already_in_queue(fallback, entity_id, endpoint)
        .await
        .map_err(|e| {
            WorkerError::fatal(queue, entity_id, format!("dedup check on {fallback} failed: {e}"))
        })?;

    if already_queued {
        info!(queue, channel, fallback, entity_id, "Item already in fallback queue, dropping");
        return Ok(ItemOutcome::AlreadyQueued {
            queue: fallback.to_string(),
        });
    }

    let update_type = item.update_type_rerouted_from(queue);
    match proxy
        .add_item_to_ahjo_queue(fallback, entity_id, endpoint, &update_type)
        .await
    {
        Some(item_id) => {
            info!(queue, channel, fallback, entity_id, update_type = %update_type, "↪️ Item rerouted");
            Ok(ItemOutcome::Rerouted {
                queue: fallback.to_string(),
                item_id,
                update_type,
            })
        }
        None => {
            error!(queue, channel, fallback, entity_id, "💥 Reroute enqueue failed");
            Err(WorkerError::fatal(
                queue,
                entity_id,
                format!("could not enqueue into {fallback}"),
            ))
        }
    }
}

/// Flags a meeting's motions for regeneration when the item still needs it.
/// A failure is reported as the item's failure reason.
async fn flag_meeting_motions(
    proxy: &dyn ProxyService,
    config: &QueueWorkerConfig,
    item: &AhjoQueueMessage,
) -> Result<(), String> {
    if !item.requires_motion_reset() {
        return Ok(());
    }

    let queue = config.name.as_str();
    let channel = config.log_channel.as_str();
    let entity_id = item.entity_id();
    match proxy.mark_meeting_motions_as_unprocessed(entity_id).await {
        Ok(()) => {
            debug!(queue, channel, entity_id, "Meeting motions flagged for regeneration");
            Ok(())
        }
        Err(e) => {
            error!(queue, channel, entity_id, error = %e, "Failed to flag meeting motions");
            Err(format!("could not flag meeting motions: {e}"))
        }
    }
}
