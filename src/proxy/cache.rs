//! Response cache for Ahjo GET requests, keyed by the full request URL.

use dashmap::DashMap;
use serde_json::Value;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct ResponseCache {
    entries: DashMap<String, (Instant, Value)>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let hit = self
            .entries
            .get(key)
            .filter(|entry| entry.0.elapsed() < self.ttl)
            .map(|entry| entry.1.clone());
        if hit.is_none() {
            self.entries.remove_if(key, |_, (stored_at, _)| stored_at.elapsed() >= self.ttl);
        }
        hit
    }

    /// Stores `value` and evicts every expired entry, so unique page URLs do
    /// not accumulate
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        if self.ttl.is_zero() {
            return;
        }
        let ttl = self.ttl;
        self.entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        self.entries.insert(key.into(), (Instant::now(), value));
    }

    pub fn invalidate(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
