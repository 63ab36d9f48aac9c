#![allow(clippy::doc_markdown)] // Allow technical terms like OAuth2, Ahjo in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Ahjo Sync
//!
//! Synchronization pipeline between the Ahjo case-management API and a local
//! content store.
//!
//! ## Overview
//!
//! Content changes in Ahjo reach the pipeline two ways: bulk listings walked
//! page by page (the aggregation feed) and webhook notifications (the
//! subscriber feed). Both end up as items in queues that workers drain by
//! migrating one entity at a time. Items that keep failing move down a retry
//! chain until they land in a terminal error queue.
//!
//! ## Module Organization
//!
//! - [`auth`] - OAuth2 token lifecycle, token store and refresh lock
//! - [`proxy`] - Authenticated, cached access to the Ahjo API and queue helpers
//! - [`worker`] - Queue state machine and queue runner
//! - [`source`] - Paginated listing iteration and the aggregation feed
//! - [`callback`] - Webhook intake into the subscriber queue
//! - [`messaging`] - Queue payloads and the queue backend contract
//! - [`resilience`] - Circuit breaker for the upstream health check
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging setup and helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ahjo_sync::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     migrations: Arc<dyn MigrationExecutor>,
//! # ) -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigManager::load()?.config().clone();
//! let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(config.request_timeout())?);
//! let tokens = Arc::new(TokenManager::from_config(
//!     &config,
//!     http.clone(),
//!     Arc::new(InMemoryTokenStore::new()),
//!     Arc::new(InMemoryLockService::new()),
//! ));
//! let queues: Arc<dyn QueueBackend> = Arc::new(InMemoryQueueBackend::new());
//! let proxy = Arc::new(AhjoProxy::new(
//!     &config,
//!     tokens,
//!     http,
//!     queues.clone(),
//!     migrations,
//!     Arc::new(InMemoryMeetingMotionStore::new()),
//! )?);
//!
//! let runner = QueueRunner::new(proxy, queues, config.lease());
//! let summary = runner
//!     .run(&QueueWorkerConfig::subscriber(&config.queues))
//!     .await?;
//! println!("removed {} items", summary.removed());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod callback;
pub mod config;
pub mod constants;
pub mod error;
pub mod http;
pub mod logging;
pub mod messaging;
pub mod proxy;
pub mod resilience;
pub mod source;
pub mod worker;

pub use config::{AhjoSyncConfig, ConfigManager, ConfigurationError};
pub use error::{AhjoSyncError, Result};

/// Commonly used types in one import
pub mod prelude {
    pub use crate::auth::{
        AuthSettings, AuthToken, FileLockService, FileTokenStore, InMemoryLockService,
        InMemoryTokenStore, LockService, TokenError, TokenManager, TokenStore,
    };
    pub use crate::callback::{enqueue_callback, CallbackOutcome, CallbackPayload};
    pub use crate::config::{AhjoSyncConfig, ConfigManager};
    pub use crate::http::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};
    pub use crate::messaging::{AhjoQueueMessage, InMemoryQueueBackend, QueueBackend};
    pub use crate::proxy::{
        AhjoProxy, InMemoryMeetingMotionStore, MeetingMotionStore, MigrationExecutor,
        ProxyService,
    };
    pub use crate::source::{
        enqueue_changed_rows, AhjoSourceIterator, ChangeDetector, PageSource, SourceOptions,
    };
    pub use crate::worker::{QueueRunner, QueueWorkerConfig, RunSummary, WorkerError};
    pub use crate::{AhjoSyncError, Result};
}
