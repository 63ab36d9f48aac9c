//! External collaborators the proxy delegates to: the migration executor
//! that imports one entity, and the store of meeting motion flags.

use super::error::ProxyResult;
use crate::constants;
use async_trait::async_trait;
use dashmap::DashSet;

#[async_trait]
pub trait MigrationExecutor: Send + Sync {
    /// Import exactly one entity and report the completion code
    async fn run(&self, endpoint: &str, entity_id: &str) -> i32;
}

#[async_trait]
pub trait MeetingMotionStore: Send + Sync {
    /// Flag the meeting so its motions are regenerated
    async fn mark_motions_unprocessed(&self, meeting_id: &str) -> ProxyResult<()>;
}

/// Typed view of a migration completion code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus(pub i32);

impl MigrationStatus {
    pub fn is_success(self) -> bool {
        self.0 == constants::MIGRATION_SUCCESS
    }

    pub fn code(self) -> i32 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct InMemoryMeetingMotionStore {
    unprocessed: DashSet<String>,
}

impl InMemoryMeetingMotionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unprocessed(&self, meeting_id: &str) -> bool {
        self.unprocessed.contains(meeting_id)
    }

    /// Clear the flag once motions have been regenerated
    pub fn mark_processed(&self, meeting_id: &str) -> bool {
        self.unprocessed.remove(meeting_id).is_some()
    }
}

#[async_trait]
impl MeetingMotionStore for InMemoryMeetingMotionStore {
    async fn mark_motions_unprocessed(&self, meeting_id: &str) -> ProxyResult<()> {
        self.unprocessed.insert(meeting_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_status() {
        assert!(MigrationStatus(1).is_success());
        assert!(!MigrationStatus(0).is_success());
        assert!(!MigrationStatus(3).is_success());
    }

    #[tokio::test]
    async fn test_motion_flags() {
        let store = InMemoryMeetingMotionStore::new();
        store.mark_motions_unprocessed("U1").await.unwrap();
        assert!(store.is_unprocessed("U1"));
        assert!(store.mark_processed("U1"));
        assert!(!store.is_unprocessed("U1"));
    }
}
