//! # Lock Service
//!
//! Named, non-reentrant, non-blocking locks used to serialize token refresh
//! across processes. Acquisition is a "set if absent" with a TTL so a crashed
//! holder cannot wedge the lock forever.

use super::error::{TokenError, TokenResult};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[async_trait]
pub trait LockService: Send + Sync {
    /// Try once to take the lock; never waits for a holder to finish
    async fn acquire(&self, name: &str, ttl: Duration) -> TokenResult<bool>;
    async fn release(&self, name: &str) -> TokenResult<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryLockService {
    held: DashMap<String, Instant>,
}

impl InMemoryLockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, name: &str) -> bool {
        self.held
            .get(name)
            .is_some_and(|expires| *expires > Instant::now())
    }
}

#[async_trait]
impl LockService for InMemoryLockService {
    async fn acquire(&self, name: &str, ttl: Duration) -> TokenResult<bool> {
        let now = Instant::now();
        match self.held.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() > now {
                    return Ok(false);
                }
                warn!(lock = %name, "🔓 Taking over expired lock");
                entry.insert(now + ttl);
                Ok(true)
            }
            Entry::Vacant(entry) => {
                entry.insert(now + ttl);
                Ok(true)
            }
        }
    }

    async fn release(&self, name: &str) -> TokenResult<()> {
        self.held.remove(name);
        Ok(())
    }
}

/// Lock files created with `create_new`, holding their expiry timestamp
#[derive(Debug, Clone)]
pub struct FileLockService {
    dir: PathBuf,
}

impl FileLockService {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn lock_path(&self, name: &str) -> PathBuf {
        let file_name: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file_name}.lock"))
    }

    async fn try_create(&self, path: &PathBuf, ttl: Duration) -> TokenResult<bool> {
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await;

        match file {
            Ok(mut file) => {
                let expires_at = Utc::now().timestamp() + ttl.as_secs() as i64;
                file.write_all(expires_at.to_string().as_bytes())
                    .await
                    .map_err(|e| TokenError::lock(format!("failed to write {}: {e}", path.display())))?;
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(TokenError::lock(format!(
                "failed to create {}: {e}",
                path.display()
            ))),
        }
    }

    async fn is_expired(&self, path: &PathBuf) -> bool {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents
                .trim()
                .parse::<i64>()
                .map(|expires_at| expires_at <= Utc::now().timestamp())
                // Unreadable stamps come from a holder that crashed mid-write
                .unwrap_or(true),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl LockService for FileLockService {
    async fn acquire(&self, name: &str, ttl: Duration) -> TokenResult<bool> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| TokenError::lock(format!("failed to create {}: {e}", self.dir.display())))?;

        let path = self.lock_path(name);
        if self.try_create(&path, ttl).await? {
            debug!(lock = %name, "🔒 Lock acquired");
            return Ok(true);
        }

        if self.is_expired(&path).await {
            warn!(lock = %name, "🔓 Removing expired lock file");
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(TokenError::lock(format!(
                        "failed to remove {}: {e}",
                        path.display()
                    )))
                }
            }
            return self.try_create(&path, ttl).await;
        }

        Ok(false)
    }

    async fn release(&self, name: &str) -> TokenResult<()> {
        let path = self.lock_path(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(lock = %name, "🔓 Lock released");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TokenError::lock(format!(
                "failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}
