//! # Ahjo Source Iterator
//!
//! Lazy walk over every object of a paginated Ahjo listing. In partial mode
//! the walk stops once `unchanged_threshold` consecutive objects are reported
//! unchanged by the [`ChangeDetector`]: the API lists the most recently
//! modified objects first, so a long run of unchanged rows means nothing newer
//! is left.

use super::cursor::PaginationCursor;
use super::error::{SourceError, SourceResult};
use super::{ChangeDetector, PageSource};
use crate::config::SourceConfig;
use crate::constants;
use futures::Stream;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOptions {
    pub partial: bool,
    pub unchanged_threshold: u32,
    pub limit_pages: Option<u64>,
    pub max_items: Option<u64>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            partial: false,
            unchanged_threshold: constants::DEFAULT_UNCHANGED_THRESHOLD,
            limit_pages: None,
            max_items: None,
        }
    }
}

impl From<&SourceConfig> for SourceOptions {
    fn from(config: &SourceConfig) -> Self {
        Self {
            partial: config.partial,
            unchanged_threshold: config.unchanged_threshold,
            limit_pages: config.limit_pages,
            max_items: config.max_items,
        }
    }
}

/// One object of a listing page
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    pub data: Value,
    /// `false` only when partial mode is on and the detector saw no change
    pub changed: bool,
}

pub struct AhjoSourceIterator {
    pages: Arc<dyn PageSource>,
    url: Url,
    options: SourceOptions,
    detector: Option<Arc<dyn ChangeDetector>>,
}

impl std::fmt::Debug for AhjoSourceIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AhjoSourceIterator")
            .field("url", &self.url.as_str())
            .field("options", &self.options)
            .field("has_detector", &self.detector.is_some())
            .finish()
    }
}

impl AhjoSourceIterator {
    pub fn new(pages: Arc<dyn PageSource>, url: &str, options: SourceOptions) -> SourceResult<Self> {
        let url = Url::parse(url).map_err(|e| SourceError::invalid_url(url, e.to_string()))?;
        Ok(Self {
            pages,
            url,
            options,
            detector: None,
        })
    }

    /// Detector consulted in partial mode; without one every row counts as changed
    pub fn with_change_detector(mut self, detector: Arc<dyn ChangeDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn options(&self) -> &SourceOptions {
        &self.options
    }

    async fn first_page(&self) -> SourceResult<(PaginationCursor, Value)> {
        let body = self.pages.fetch_page(self.url.as_str()).await?;
        let cursor = PaginationCursor::from_page(&body, self.url.as_str())?;
        Ok((cursor, body))
    }

    /// Read the cursor from the first page
    pub async fn cursor(&self) -> SourceResult<PaginationCursor> {
        Ok(self.first_page().await?.0)
    }

    /// Number of rows the walk will cover, before any early stop
    pub async fn count(&self) -> SourceResult<u64> {
        Ok(self.cursor().await?.effective_count(self.options.limit_pages))
    }

    pub async fn build_urls(&self) -> SourceResult<Vec<String>> {
        let cursor = self.cursor().await?;
        Ok(cursor
            .build_urls(&self.url, self.options.limit_pages)
            .into_iter()
            .map(String::from)
            .collect())
    }

    /// Fresh walk from the first page
    pub fn rows(&self) -> SourceRows<'_> {
        SourceRows {
            iterator: self,
            pending_urls: VecDeque::new(),
            page: VecDeque::new(),
            started: false,
            finished: false,
            unchanged_run: 0,
            yielded: 0,
        }
    }

    async fn is_changed(&self, row: &Value) -> bool {
        match (&self.detector, self.options.partial) {
            (Some(detector), true) => !detector.is_unchanged(row).await,
            _ => true,
        }
    }
}

fn page_objects(body: Value, url: &str) -> SourceResult<VecDeque<Value>> {
    match body {
        Value::Object(mut map) => match map.remove("objects") {
            Some(Value::Array(objects)) => Ok(objects.into()),
            Some(_) => Err(SourceError::invalid_metadata("objects", url, "not an array")),
            None => Err(SourceError::missing_metadata("objects", url)),
        },
        _ => Err(SourceError::missing_metadata("objects", url)),
    }
}

/// In-progress walk created by [`AhjoSourceIterator::rows`]
pub struct SourceRows<'a> {
    iterator: &'a AhjoSourceIterator,
    pending_urls: VecDeque<Url>,
    page: VecDeque<Value>,
    started: bool,
    finished: bool,
    unchanged_run: u32,
    yielded: u64,
}

impl<'a> SourceRows<'a> {
    /// Next row, or `None` once the walk is exhausted or stopped early.
    /// An error ends the walk.
    pub async fn next(&mut self) -> Option<SourceResult<SourceRow>> {
        match self.advance().await {
            Ok(row) => row.map(Ok),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }

    pub fn yielded(&self) -> u64 {
        self.yielded
    }

    pub fn into_stream(self) -> impl Stream<Item = SourceResult<SourceRow>> + 'a {
        futures::stream::unfold(self, |mut rows| async move {
            rows.next().await.map(|row| (row, rows))
        })
    }

    async fn start(&mut self) -> SourceResult<()> {
        self.started = true;
        let options = &self.iterator.options;
        let (cursor, body) = self.iterator.first_page().await?;

        let mut urls: VecDeque<Url> = cursor
            .build_urls(&self.iterator.url, options.limit_pages)
            .into();
        info!(
            url = %self.iterator.url,
            total_count = cursor.total_count,
            effective_count = cursor.effective_count(options.limit_pages),
            pages = urls.len(),
            partial = options.partial,
            "📚 Source iteration started"
        );

        // The first page is already in hand
        if urls.pop_front().is_some() {
            self.page = page_objects(body, self.iterator.url.as_str())?;
        }
        self.pending_urls = urls;
        Ok(())
    }

    async fn advance(&mut self) -> SourceResult<Option<SourceRow>> {
        if !self.started {
            self.start().await?;
        }

        loop {
            if self.finished {
                return Ok(None);
            }

            if let Some(max) = self.iterator.options.max_items {
                if self.yielded >= max {
                    debug!(max_items = max, "Source item cap reached");
                    self.finished = true;
                    return Ok(None);
                }
            }

            if let Some(data) = self.page.pop_front() {
                self.yielded += 1;
                let changed = self.iterator.is_changed(&data).await;
                if changed {
                    self.unchanged_run = 0;
                } else {
                    self.unchanged_run += 1;
                    if self.unchanged_run >= self.iterator.options.unchanged_threshold {
                        info!(
                            unchanged = self.unchanged_run,
                            yielded = self.yielded,
                            "🛑 Unchanged rows threshold reached, stopping partial iteration"
                        );
                        self.finished = true;
                    }
                }
                return Ok(Some(SourceRow { data, changed }));
            }

            let Some(url) = self.pending_urls.pop_front() else {
                self.finished = true;
                return Ok(None);
            };
            debug!(url = %url, "Fetching source page");
            let body = self.iterator.pages.fetch_page(url.as_str()).await?;
            self.page = page_objects(body, url.as_str())?;
        }
    }
}
