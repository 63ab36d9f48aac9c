//! # Token Store
//!
//! Durable key/value storage for persisted tokens.
//!
//! ```rust
//! use ahjo_sync::auth::{InMemoryTokenStore, TokenStore};
//!
//! # tokio_test::block_on(async {
//! let store = InMemoryTokenStore::new();
//! store.set("ahjo_api.auth_token.test", "{}").await.unwrap();
//! assert_eq!(
//!     store.get("ahjo_api.auth_token.test").await.unwrap().as_deref(),
//!     Some("{}")
//! );
//! # });
//! ```

use super::error::{TokenError, TokenResult};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: &str) -> TokenResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> TokenResult<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    values: DashMap<String, String>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self, key: &str) -> TokenResult<Option<String>> {
        Ok(self.values.get(key).map(|value| value.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> TokenResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Stores every key in one JSON object file, rewritten atomically
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> TokenResult<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                TokenError::store(format!("corrupt store {}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(TokenError::store(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: &str) -> TokenResult<Option<String>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> TokenResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value.to_string());
        let contents = serde_json::to_string_pretty(&values)
            .map_err(|e| TokenError::store(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TokenError::store(format!("failed to create {}: {e}", parent.display())))?;
        }

        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, contents)
            .await
            .map_err(|e| TokenError::store(format!("failed to write {}: {e}", tmp_path.display())))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| TokenError::store(format!("failed to replace {}: {e}", self.path.display())))
    }
}
