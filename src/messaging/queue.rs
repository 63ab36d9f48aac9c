//! # Queue Backend
//!
//! Consumer contract of the queue backend: create, claim with a lease,
//! delete, release. Items whose lease runs out without being deleted are
//! handed out again (at-least-once delivery).

use super::errors::MessagingResult;
use super::message::{AhjoQueueMessage, ClaimedItem};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Store a new item; `None` means the backend refused it
    async fn create_item(
        &self,
        queue: &str,
        message: &AhjoQueueMessage,
    ) -> MessagingResult<Option<String>>;

    /// Lease the oldest available item
    async fn claim_item(&self, queue: &str, lease: Duration)
        -> MessagingResult<Option<ClaimedItem>>;

    async fn delete_item(&self, item: &ClaimedItem) -> MessagingResult<()>;

    /// Drop the lease so the item can be claimed again immediately
    async fn release_item(&self, item: &ClaimedItem) -> MessagingResult<bool>;

    /// Whether an item for `(entity_id, endpoint)` is stored in `queue`,
    /// leased or not
    async fn contains_item(
        &self,
        queue: &str,
        entity_id: &str,
        endpoint: &str,
    ) -> MessagingResult<bool>;

    async fn number_of_items(&self, queue: &str) -> MessagingResult<usize>;
}

#[derive(Debug)]
struct StoredItem {
    item_id: String,
    data: AhjoQueueMessage,
    enqueued_at: i64,
    leased_until: Option<Instant>,
}

impl StoredItem {
    fn is_available(&self, now: Instant) -> bool {
        self.leased_until.map_or(true, |until| until <= now)
    }
}

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<StoredItem>,
    /// Item counts per `(entity_id, endpoint)`
    index: HashMap<(String, String), usize>,
}

impl QueueState {
    fn index_key(data: &AhjoQueueMessage) -> (String, String) {
        (data.entity_id().to_string(), data.endpoint().to_string())
    }

    fn unindex(&mut self, data: &AhjoQueueMessage) {
        let key = Self::index_key(data);
        if let Some(count) = self.index.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.index.remove(&key);
            }
        }
    }
}

/// Process-local backend with FIFO order, leases and an O(1) dedup index
#[derive(Debug, Default)]
pub struct InMemoryQueueBackend {
    queues: Mutex<HashMap<String, QueueState>>,
    max_items_per_queue: Option<usize>,
}

impl InMemoryQueueBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse new items once a queue holds `max_items`
    pub fn with_max_items_per_queue(max_items: usize) -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            max_items_per_queue: Some(max_items),
        }
    }

    /// Snapshot of the payloads stored in `queue`, in FIFO order
    pub fn items(&self, queue: &str) -> Vec<AhjoQueueMessage> {
        self.queues
            .lock()
            .get(queue)
            .map(|state| state.items.iter().map(|item| item.data.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl QueueBackend for InMemoryQueueBackend {
    async fn create_item(
        &self,
        queue: &str,
        message: &AhjoQueueMessage,
    ) -> MessagingResult<Option<String>> {
        let mut queues = self.queues.lock();
        let state = queues.entry(queue.to_string()).or_default();

        if self
            .max_items_per_queue
            .is_some_and(|max| state.items.len() >= max)
        {
            warn!(queue = %queue, "📭 Queue at capacity, item refused");
            return Ok(None);
        }

        let item_id = Uuid::new_v4().to_string();
        *state.index.entry(QueueState::index_key(message)).or_insert(0) += 1;
        state.items.push_back(StoredItem {
            item_id: item_id.clone(),
            data: message.clone(),
            enqueued_at: Utc::now().timestamp(),
            leased_until: None,
        });

        debug!(queue = %queue, item_id = %item_id, "📤 Item created");
        Ok(Some(item_id))
    }

    async fn claim_item(
        &self,
        queue: &str,
        lease: Duration,
    ) -> MessagingResult<Option<ClaimedItem>> {
        let now = Instant::now();
        let mut queues = self.queues.lock();
        let Some(state) = queues.get_mut(queue) else {
            return Ok(None);
        };

        let claimed = state
            .items
            .iter_mut()
            .find(|item| item.is_available(now))
            .map(|item| {
                item.leased_until = Some(now + lease);
                ClaimedItem {
                    item_id: item.item_id.clone(),
                    queue: queue.to_string(),
                    data: item.data.clone(),
                    enqueued_at: item.enqueued_at,
                }
            });

        if let Some(item) = &claimed {
            debug!(queue = %queue, item_id = %item.item_id, "📥 Item claimed");
        }
        Ok(claimed)
    }

    async fn delete_item(&self, item: &ClaimedItem) -> MessagingResult<()> {
        let mut queues = self.queues.lock();
        if let Some(state) = queues.get_mut(&item.queue) {
            if let Some(position) = state
                .items
                .iter()
                .position(|stored| stored.item_id == item.item_id)
            {
                if let Some(removed) = state.items.remove(position) {
                    state.unindex(&removed.data);
                }
                debug!(queue = %item.queue, item_id = %item.item_id, "🗑️ Item deleted");
            }
        }
        Ok(())
    }

    async fn release_item(&self, item: &ClaimedItem) -> MessagingResult<bool> {
        let mut queues = self.queues.lock();
        let released = queues
            .get_mut(&item.queue)
            .and_then(|state| {
                state
                    .items
                    .iter_mut()
                    .find(|stored| stored.item_id == item.item_id)
            })
            .map(|stored| stored.leased_until = None)
            .is_some();
        Ok(released)
    }

    async fn contains_item(
        &self,
        queue: &str,
        entity_id: &str,
        endpoint: &str,
    ) -> MessagingResult<bool> {
        Ok(self.queues.lock().get(queue).is_some_and(|state| {
            state
                .index
                .contains_key(&(entity_id.to_string(), endpoint.to_string()))
        }))
    }

    async fn number_of_items(&self, queue: &str) -> MessagingResult<usize> {
        Ok(self
            .queues
            .lock()
            .get(queue)
            .map_or(0, |state| state.items.len()))
    }
}
