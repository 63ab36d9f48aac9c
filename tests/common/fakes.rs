//! Scriptable stand-ins for the external collaborators.

use ahjo_sync::http::{HttpClient, HttpError, HttpRequest, HttpResponse};
use ahjo_sync::proxy::{MigrationExecutor, ProxyError, ProxyResult, ProxyService};
use ahjo_sync::source::{ChangeDetector, PageSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::time::Duration;

/// HTTP client answering by URL prefix; later routes win
#[derive(Default)]
pub struct MockHttp {
    routes: Mutex<Vec<(String, u16, String)>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Option<Duration>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn respond(&self, url_prefix: &str, status: u16, body: impl Into<String>) {
        self.routes
            .lock()
            .push((url_prefix.to_string(), status, body.into()));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, url_prefix: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.url.starts_with(url_prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HttpClient for MockHttp {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let route = self
            .routes
            .lock()
            .iter()
            .rev()
            .find(|(prefix, _, _)| request.url.starts_with(prefix.as_str()))
            .map(|(_, status, body)| HttpResponse::new(*status, body.clone()));
        route.ok_or_else(|| HttpError::transport(&request.url, "connection refused"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyCall {
    IsOperational,
    Migrate {
        endpoint: String,
        entity_id: String,
    },
    Add {
        queue: String,
        entity_id: String,
        endpoint: String,
        update_type: String,
    },
    Check {
        queue: String,
        entity_id: String,
        endpoint: String,
    },
    MarkMotions {
        meeting_id: String,
    },
}

/// Proxy recording every call, with switchable answers
pub struct MockProxy {
    operational: AtomicBool,
    migrate_status: AtomicI32,
    already_queued: AtomicBool,
    dedup_fails: AtomicBool,
    enqueue_fails: AtomicBool,
    motions_fail: AtomicBool,
    next_item: AtomicUsize,
    calls: Mutex<Vec<ProxyCall>>,
}

impl Default for MockProxy {
    fn default() -> Self {
        Self {
            operational: AtomicBool::new(true),
            migrate_status: AtomicI32::new(1),
            already_queued: AtomicBool::new(false),
            dedup_fails: AtomicBool::new(false),
            enqueue_fails: AtomicBool::new(false),
            motions_fail: AtomicBool::new(false),
            next_item: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_operational(&self, value: bool) {
        self.operational.store(value, Ordering::SeqCst);
    }

    pub fn set_migrate_status(&self, status: i32) {
        self.migrate_status.store(status, Ordering::SeqCst);
    }

    pub fn set_already_queued(&self, value: bool) {
        self.already_queued.store(value, Ordering::SeqCst);
    }

    pub fn set_dedup_fails(&self, value: bool) {
        self.dedup_fails.store(value, Ordering::SeqCst);
    }

    pub fn set_enqueue_fails(&self, value: bool) {
        self.enqueue_fails.store(value, Ordering::SeqCst);
    }

    pub fn set_motions_fail(&self, value: bool) {
        self.motions_fail.store(value, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ProxyCall> {
        self.calls.lock().clone()
    }

    pub fn added(&self) -> Vec<ProxyCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, ProxyCall::Add { .. }))
            .collect()
    }

    pub fn checked(&self) -> Vec<ProxyCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, ProxyCall::Check { .. }))
            .collect()
    }

    pub fn marked_meetings(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ProxyCall::MarkMotions { meeting_id } => Some(meeting_id),
                _ => None,
            })
            .collect()
    }

    pub fn migrations(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ProxyCall::Migrate { .. }))
            .count()
    }

    fn record(&self, call: ProxyCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl ProxyService for MockProxy {
    async fn is_operational(&self) -> bool {
        self.record(ProxyCall::IsOperational);
        self.operational.load(Ordering::SeqCst)
    }

    async fn migrate_single_entity(&self, endpoint: &str, entity_id: &str) -> i32 {
        self.record(ProxyCall::Migrate {
            endpoint: endpoint.to_string(),
            entity_id: entity_id.to_string(),
        });
        self.migrate_status.load(Ordering::SeqCst)
    }

    async fn add_item_to_ahjo_queue(
        &self,
        queue: &str,
        entity_id: &str,
        endpoint: &str,
        update_type: &str,
    ) -> Option<String> {
        self.record(ProxyCall::Add {
            queue: queue.to_string(),
            entity_id: entity_id.to_string(),
            endpoint: endpoint.to_string(),
            update_type: update_type.to_string(),
        });
        if self.enqueue_fails.load(Ordering::SeqCst) {
            return None;
        }
        let n = self.next_item.fetch_add(1, Ordering::SeqCst);
        Some(format!("item-{n}"))
    }

    async fn check_if_item_is_already_in_queue(
        &self,
        queue: &str,
        entity_id: &str,
        endpoint: &str,
    ) -> ProxyResult<bool> {
        self.record(ProxyCall::Check {
            queue: queue.to_string(),
            entity_id: entity_id.to_string(),
            endpoint: endpoint.to_string(),
        });
        if self.dedup_fails.load(Ordering::SeqCst) {
            return Err(ProxyError::collaborator("queue", "dedup lookup failed"));
        }
        Ok(self.already_queued.load(Ordering::SeqCst))
    }

    async fn mark_meeting_motions_as_unprocessed(&self, meeting_id: &str) -> ProxyResult<()> {
        self.record(ProxyCall::MarkMotions {
            meeting_id: meeting_id.to_string(),
        });
        if self.motions_fail.load(Ordering::SeqCst) {
            return Err(ProxyError::collaborator("motions", "store unavailable"));
        }
        Ok(())
    }
}

/// Migration executor returning a fixed status and counting runs
pub struct StaticMigrationExecutor {
    status: i32,
    runs: Mutex<Vec<(String, String)>>,
}

impl StaticMigrationExecutor {
    pub fn new(status: i32) -> Self {
        Self {
            status,
            runs: Mutex::new(Vec::new()),
        }
    }

    pub fn runs(&self) -> Vec<(String, String)> {
        self.runs.lock().clone()
    }
}

#[async_trait]
impl MigrationExecutor for StaticMigrationExecutor {
    async fn run(&self, endpoint: &str, entity_id: &str) -> i32 {
        self.runs
            .lock()
            .push((endpoint.to_string(), entity_id.to_string()));
        self.status
    }
}

/// Paginated listing served from memory.
///
/// Rows are `{"id": "<n>"}` for `n` in `0..total_count`; pages honour the
/// `limit` and `offset` query parameters of the requested URL.
pub struct ListingPages {
    total_count: u64,
    default_limit: u64,
    fetched: Mutex<Vec<String>>,
}

impl ListingPages {
    pub fn new(total_count: u64, default_limit: u64) -> Self {
        Self {
            total_count,
            default_limit,
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().clone()
    }
}

#[async_trait]
impl PageSource for ListingPages {
    async fn fetch_page(&self, url: &str) -> ProxyResult<Value> {
        self.fetched.lock().push(url.to_string());
        let parsed = url::Url::parse(url).map_err(|e| ProxyError::malformed_body(url, e.to_string()))?;
        let param = |name: &str| {
            parsed
                .query_pairs()
                .find(|(key, _)| key == name)
                .and_then(|(_, value)| value.parse::<u64>().ok())
        };
        let limit = param("limit").unwrap_or(self.default_limit);
        let offset = param("offset").unwrap_or(0);

        let objects: Vec<Value> = (offset..self.total_count.min(offset + limit))
            .map(|n| json!({"id": n.to_string()}))
            .collect();

        Ok(json!({
            "meta": {"limit": limit, "offset": offset, "total_count": self.total_count},
            "objects": objects
        }))
    }
}

/// Reports the listed ids as unchanged
#[derive(Default)]
pub struct SetChangeDetector {
    unchanged: HashSet<String>,
}

impl SetChangeDetector {
    pub fn new(unchanged: impl IntoIterator<Item = String>) -> Self {
        Self {
            unchanged: unchanged.into_iter().collect(),
        }
    }

    pub fn range(ids: std::ops::Range<u64>) -> Self {
        Self::new(ids.map(|n| n.to_string()))
    }
}

#[async_trait]
impl ChangeDetector for SetChangeDetector {
    async fn is_unchanged(&self, row: &Value) -> bool {
        row.get("id")
            .and_then(Value::as_str)
            .is_some_and(|id| self.unchanged.contains(id))
    }
}

/// Canned bodies keyed by exact URL
#[derive(Default)]
pub struct StaticPages {
    pages: HashMap<String, Value>,
}

impl StaticPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: Value) -> Self {
        self.pages.insert(url.to_string(), body);
        self
    }
}

#[async_trait]
impl PageSource for StaticPages {
    async fn fetch_page(&self, url: &str) -> ProxyResult<Value> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ProxyError::http_status(404, url, "not found"))
    }
}
