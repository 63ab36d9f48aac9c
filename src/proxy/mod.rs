//! # Ahjo Proxy
//!
//! Data fetch and cache layer in front of the Ahjo API, plus the queue and
//! migration helpers the workers use. [`ProxyService`] is the seam the queue
//! worker depends on; [`AhjoProxy`] is the production implementation.

pub mod cache;
pub mod collaborators;
pub mod error;

use crate::auth::TokenManager;
use crate::config::AhjoSyncConfig;
use crate::http::{HttpClient, HttpError, HttpRequest};
use crate::logging::{log_error, log_queue_operation};
use crate::messaging::{AhjoQueueMessage, QueueBackend};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};
use crate::source::PageSource;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

pub use cache::ResponseCache;
pub use collaborators::{
    InMemoryMeetingMotionStore, MeetingMotionStore, MigrationExecutor, MigrationStatus,
};
pub use error::{ProxyError, ProxyResult};

/// Operations the queue worker needs from the proxy
#[async_trait]
pub trait ProxyService: Send + Sync {
    /// Point-in-time signal whether Ahjo can be worked against at all
    async fn is_operational(&self) -> bool;

    /// Import one entity; `1` means success
    async fn migrate_single_entity(&self, endpoint: &str, entity_id: &str) -> i32;

    /// Enqueue a new item; `None` signals the enqueue failed
    async fn add_item_to_ahjo_queue(
        &self,
        queue: &str,
        entity_id: &str,
        endpoint: &str,
        update_type: &str,
    ) -> Option<String>;

    async fn check_if_item_is_already_in_queue(
        &self,
        queue: &str,
        entity_id: &str,
        endpoint: &str,
    ) -> ProxyResult<bool>;

    async fn mark_meeting_motions_as_unprocessed(&self, meeting_id: &str) -> ProxyResult<()>;
}

pub struct AhjoProxy {
    base_url: Url,
    health_check_path: Option<String>,
    tokens: Arc<TokenManager>,
    http: Arc<dyn HttpClient>,
    queues: Arc<dyn QueueBackend>,
    migrations: Arc<dyn MigrationExecutor>,
    motions: Arc<dyn MeetingMotionStore>,
    cache: ResponseCache,
    breaker: Option<CircuitBreaker>,
}

impl std::fmt::Debug for AhjoProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AhjoProxy")
            .field("base_url", &self.base_url.as_str())
            .field("health_check_path", &self.health_check_path)
            .field("cached_responses", &self.cache.len())
            .field("circuit_breaker", &self.breaker.as_ref().map(CircuitBreaker::state))
            .finish_non_exhaustive()
    }
}

impl AhjoProxy {
    pub fn new(
        config: &AhjoSyncConfig,
        tokens: Arc<TokenManager>,
        http: Arc<dyn HttpClient>,
        queues: Arc<dyn QueueBackend>,
        migrations: Arc<dyn MigrationExecutor>,
        motions: Arc<dyn MeetingMotionStore>,
    ) -> ProxyResult<Self> {
        let base_url = Url::parse(&config.api.base_url)
            .map_err(|e| HttpError::invalid_url(&config.api.base_url, e.to_string()))?;

        let breaker = config.health.circuit_breaker_enabled.then(|| {
            CircuitBreaker::new(
                "ahjo_api",
                CircuitBreakerConfig::from_health_config(&config.health),
            )
        });

        Ok(Self {
            base_url,
            health_check_path: config.api.health_check_path.clone(),
            tokens,
            http,
            queues,
            migrations,
            motions,
            cache: ResponseCache::new(config.cache_ttl()),
            breaker,
        })
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn circuit_breaker(&self) -> Option<&CircuitBreaker> {
        self.breaker.as_ref()
    }

    fn endpoint_url(&self, endpoint: &str, query: &[(&str, &str)]) -> ProxyResult<Url> {
        let mut url = self
            .base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| HttpError::invalid_url(endpoint, e.to_string()))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// GET `endpoint` relative to the API base URL with `query` appended
    pub async fn get_data(&self, endpoint: &str, query: &[(&str, &str)]) -> ProxyResult<Value> {
        let url = self.endpoint_url(endpoint, query)?;
        self.get_url(url.as_str()).await
    }

    /// GET an absolute Ahjo URL; successful responses are cached by URL
    pub async fn get_url(&self, url: &str) -> ProxyResult<Value> {
        if let Some(cached) = self.cache.get(url) {
            debug!(url = %url, "📦 Cache hit");
            return Ok(cached);
        }

        let token = self.tokens.get_auth_token().await;
        if token.is_empty() {
            return Err(ProxyError::token_unavailable("no access token stored"));
        }

        let request = HttpRequest::get(url)
            .bearer_auth(&token)
            .header("Accept", "application/json");
        let response = self.http.send(request).await?;

        if !response.is_success() {
            warn!(url = %url, status = response.status, "Ahjo request failed");
            return Err(ProxyError::http_status(response.status, url, response.body));
        }

        let body: Value = serde_json::from_str(&response.body)
            .map_err(|e| ProxyError::malformed_body(url, e.to_string()))?;
        self.cache.insert(url, body.clone());
        Ok(body)
    }

    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    async fn probe(&self) -> ProxyResult<()> {
        if !self.tokens.is_configured().await {
            return Err(ProxyError::token_unavailable("authentication not configured"));
        }
        if !self.tokens.check_auth_token().await {
            return Err(ProxyError::token_unavailable("access token expired"));
        }

        if let Some(path) = &self.health_check_path {
            let url = self.endpoint_url(path, &[])?;
            let token = self.tokens.get_auth_token().await;
            let response = self
                .http
                .send(HttpRequest::get(url.as_str()).bearer_auth(&token))
                .await?;
            if !response.is_success() {
                return Err(ProxyError::http_status(response.status, url, response.body));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ProxyService for AhjoProxy {
    async fn is_operational(&self) -> bool {
        let result = match &self.breaker {
            Some(breaker) => breaker.call(|| self.probe()).await.map_err(|e| match e {
                CircuitBreakerError::CircuitOpen { component } => {
                    ProxyError::collaborator("circuit_breaker", format!("{component} circuit open"))
                }
                CircuitBreakerError::OperationFailed(inner) => inner,
            }),
            None => self.probe().await,
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "⚠️ Ahjo API not operational");
                false
            }
        }
    }

    async fn migrate_single_entity(&self, endpoint: &str, entity_id: &str) -> i32 {
        let status = MigrationStatus(self.migrations.run(endpoint, entity_id).await);
        info!(
            endpoint = %endpoint,
            entity_id = %entity_id,
            status = status.code(),
            success = status.is_success(),
            "🔄 Single entity migration finished"
        );
        status.code()
    }

    async fn add_item_to_ahjo_queue(
        &self,
        queue: &str,
        entity_id: &str,
        endpoint: &str,
        update_type: &str,
    ) -> Option<String> {
        let message = AhjoQueueMessage::new(endpoint, entity_id, update_type)
            .with_created(Utc::now().timestamp());

        match self.queues.create_item(queue, &message).await {
            Ok(Some(item_id)) => {
                log_queue_operation(
                    "enqueue",
                    queue,
                    Some(entity_id),
                    Some(endpoint),
                    "success",
                    Some(update_type),
                );
                Some(item_id)
            }
            Ok(None) => {
                log_error("proxy", "enqueue", "queue backend refused item", Some(queue));
                None
            }
            Err(e) => {
                log_error("proxy", "enqueue", &e.to_string(), Some(queue));
                None
            }
        }
    }

    async fn check_if_item_is_already_in_queue(
        &self,
        queue: &str,
        entity_id: &str,
        endpoint: &str,
    ) -> ProxyResult<bool> {
        Ok(self.queues.contains_item(queue, entity_id, endpoint).await?)
    }

    async fn mark_meeting_motions_as_unprocessed(&self, meeting_id: &str) -> ProxyResult<()> {
        self.motions.mark_motions_unprocessed(meeting_id).await?;
        debug!(meeting_id = %meeting_id, "Meeting motions marked unprocessed");
        Ok(())
    }
}

#[async_trait]
impl PageSource for AhjoProxy {
    async fn fetch_page(&self, url: &str) -> ProxyResult<Value> {
        self.get_url(url).await
    }
}
