//! # Queue Runner
//!
//! Drains one queue per invocation, one item at a time, and maps each
//! processing result onto the backend: successful outcomes delete the item,
//! retryable failures leave it leased so it is redelivered after the lease
//! runs out, and a suspend releases it and ends the run. Fatal failures leave
//! the item leased, are collected in the [`RunSummary`] and the run moves on.

use super::config::QueueWorkerConfig;
use super::error::WorkerError;
use super::processor::{process_item, ItemOutcome};
use crate::logging::{log_error, log_queue_operation};
use crate::messaging::QueueBackend;
use crate::proxy::ProxyService;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Item that failed with no further home during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalItem {
    pub item_id: String,
    pub entity_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub claimed: usize,
    pub migrated: usize,
    pub rerouted: usize,
    pub already_queued: usize,
    pub retried: usize,
    pub suspended: bool,
    pub fatal: Vec<FatalItem>,
}

impl RunSummary {
    pub fn removed(&self) -> usize {
        self.migrated + self.rerouted + self.already_queued
    }

    pub fn has_fatal(&self) -> bool {
        !self.fatal.is_empty()
    }
}

pub struct QueueRunner {
    proxy: Arc<dyn ProxyService>,
    backend: Arc<dyn QueueBackend>,
    lease: Duration,
    max_items: Option<usize>,
}

impl std::fmt::Debug for QueueRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueRunner")
            .field("lease", &self.lease)
            .field("max_items", &self.max_items)
            .finish_non_exhaustive()
    }
}

impl QueueRunner {
    pub fn new(
        proxy: Arc<dyn ProxyService>,
        backend: Arc<dyn QueueBackend>,
        lease: Duration,
    ) -> Self {
        Self {
            proxy,
            backend,
            lease,
            max_items: None,
        }
    }

    /// Stop after claiming `max_items` items
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    pub async fn run(&self, config: &QueueWorkerConfig) -> Result<RunSummary, WorkerError> {
        let queue = config.name.as_str();
        let channel = config.log_channel.as_str();
        let mut summary = RunSummary::default();

        info!(queue, channel, "▶️ Queue run started");

        while self.max_items.map_or(true, |max| summary.claimed < max) {
            let Some(item) = self.backend.claim_item(queue, self.lease).await? else {
                break;
            };
            summary.claimed += 1;

            match process_item(self.proxy.as_ref(), config, &item.data).await {
                Ok(outcome) => {
                    self.backend.delete_item(&item).await?;
                    let status = match &outcome {
                        ItemOutcome::Migrated => {
                            summary.migrated += 1;
                            "migrated"
                        }
                        ItemOutcome::Rerouted { .. } => {
                            summary.rerouted += 1;
                            "rerouted"
                        }
                        ItemOutcome::AlreadyQueued { .. } => {
                            summary.already_queued += 1;
                            "already_queued"
                        }
                    };
                    log_queue_operation(
                        "process",
                        queue,
                        Some(item.data.entity_id()),
                        Some(item.data.endpoint()),
                        status,
                        None,
                    );
                }
                Err(WorkerError::Retryable { reason, .. }) => {
                    summary.retried += 1;
                    log_queue_operation(
                        "process",
                        queue,
                        Some(item.data.entity_id()),
                        Some(item.data.endpoint()),
                        "retry",
                        Some(&reason),
                    );
                }
                Err(e @ WorkerError::Suspend { .. }) => {
                    if !self.backend.release_item(&item).await? {
                        warn!(queue, channel, item_id = %item.item_id, "Suspended item was no longer leased");
                    }
                    summary.suspended = true;
                    warn!(queue, channel, error = %e, "⏸️ Queue run suspended");
                    break;
                }
                Err(WorkerError::Fatal {
                    entity_id, reason, ..
                }) => {
                    log_error(
                        "worker",
                        "process",
                        &format!("item {entity_id} has no further home: {reason}"),
                        Some(queue),
                    );
                    summary.fatal.push(FatalItem {
                        item_id: item.item_id.clone(),
                        entity_id,
                        reason,
                    });
                }
                Err(e) => {
                    log_error("worker", "process", &e.to_string(), Some(queue));
                    return Err(e);
                }
            }
        }

        info!(
            queue,
            channel,
            claimed = summary.claimed,
            removed = summary.removed(),
            retried = summary.retried,
            fatal = summary.fatal.len(),
            suspended = summary.suspended,
            "⏹️ Queue run finished"
        );
        Ok(summary)
    }
}
