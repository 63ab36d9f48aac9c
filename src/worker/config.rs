//! # Queue Worker Configuration
//!
//! The four Ahjo queues share one processing routine and differ only in the
//! values held here.

use crate::config::QueueConfig;
use crate::constants::{channels, queues};
use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueWorkerConfig {
    /// Queue the worker consumes; appended as provenance on reroute
    pub name: String,
    /// Items older than this are rerouted instead of retried in place
    pub max_retry_window: TimeDelta,
    /// Next queue in the chain, `None` for the terminal queue
    pub fallback_queue: Option<String>,
    pub log_channel: String,
}

fn hours(value: i64) -> TimeDelta {
    TimeDelta::try_hours(value).unwrap_or(TimeDelta::MAX)
}

impl QueueWorkerConfig {
    pub fn aggregation(config: &QueueConfig) -> Self {
        Self {
            name: queues::AGGREGATION.to_string(),
            max_retry_window: hours(config.default_max_retry_hours),
            fallback_queue: Some(queues::RETRY.to_string()),
            log_channel: channels::AGGREGATION.to_string(),
        }
    }

    pub fn subscriber(config: &QueueConfig) -> Self {
        Self {
            name: queues::SUBSCRIBER.to_string(),
            max_retry_window: hours(config.subscriber_max_retry_hours),
            fallback_queue: Some(queues::RETRY.to_string()),
            log_channel: channels::SUBSCRIBER.to_string(),
        }
    }

    pub fn retry(config: &QueueConfig) -> Self {
        Self {
            name: queues::RETRY.to_string(),
            max_retry_window: hours(config.default_max_retry_hours),
            fallback_queue: Some(queues::ERROR.to_string()),
            log_channel: channels::RETRY.to_string(),
        }
    }

    pub fn error(config: &QueueConfig) -> Self {
        Self {
            name: queues::ERROR.to_string(),
            max_retry_window: hours(config.default_max_retry_hours),
            fallback_queue: None,
            log_channel: channels::ERROR.to_string(),
        }
    }

    /// Preset for one of the known queue names
    pub fn for_queue(name: &str, config: &QueueConfig) -> Option<Self> {
        match name {
            queues::AGGREGATION => Some(Self::aggregation(config)),
            queues::SUBSCRIBER => Some(Self::subscriber(config)),
            queues::RETRY => Some(Self::retry(config)),
            queues::ERROR => Some(Self::error(config)),
            _ => None,
        }
    }

    pub fn with_max_retry_window(mut self, window: TimeDelta) -> Self {
        self.max_retry_window = window;
        self
    }

    pub fn with_fallback_queue(mut self, fallback: Option<String>) -> Self {
        self.fallback_queue = fallback;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.fallback_queue.is_none()
    }

    /// Unix timestamp at or before which an item counts as expired
    pub fn max_retry_time(&self, now: DateTime<Utc>) -> i64 {
        now.checked_sub_signed(self.max_retry_window)
            .map_or(i64::MIN, |cutoff| cutoff.timestamp())
    }

    /// Items without a creation time are always expired
    pub fn is_expired(&self, created: Option<i64>, now: DateTime<Utc>) -> bool {
        created.map_or(true, |created| created <= self.max_retry_time(now))
    }
}
