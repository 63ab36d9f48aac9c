//! # Paginated Source
//!
//! Iteration over paginated Ahjo listings and the aggregation feed built on
//! top of it.

pub mod cursor;
pub mod error;
pub mod iterator;

use crate::constants::{self, queues};
use crate::proxy::{ProxyResult, ProxyService};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

pub use cursor::PaginationCursor;
pub use error::{SourceError, SourceResult};
pub use iterator::{AhjoSourceIterator, SourceOptions, SourceRow, SourceRows};

/// Fetches one page body by absolute URL
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> ProxyResult<Value>;
}

/// Compares a listing row against local state
#[async_trait]
pub trait ChangeDetector: Send + Sync {
    async fn is_unchanged(&self, row: &Value) -> bool;
}

/// Entity identifier of a listing row, string or numeric
pub fn row_entity_id(row: &Value, id_field: &str) -> Option<String> {
    match row.get(id_field)? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Walk `iterator` and enqueue every changed row into the aggregation queue
/// with update type `Updated`. Rows already waiting there are skipped.
/// Returns how many items were enqueued.
pub async fn enqueue_changed_rows(
    iterator: &AhjoSourceIterator,
    proxy: &dyn ProxyService,
    endpoint: &str,
    id_field: &str,
) -> SourceResult<usize> {
    let mut rows = iterator.rows();
    let mut enqueued = 0;

    while let Some(row) = rows.next().await {
        let row = row?;
        if !row.changed {
            continue;
        }

        let Some(entity_id) = row_entity_id(&row.data, id_field) else {
            warn!(endpoint, id_field, "Listing row without identifier skipped");
            continue;
        };

        if proxy
            .check_if_item_is_already_in_queue(queues::AGGREGATION, &entity_id, endpoint)
            .await?
        {
            continue;
        }

        proxy
            .add_item_to_ahjo_queue(
                queues::AGGREGATION,
                &entity_id,
                endpoint,
                constants::UPDATED_PREFIX,
            )
            .await
            .ok_or_else(|| SourceError::enqueue(queues::AGGREGATION, endpoint, &entity_id))?;
        enqueued += 1;
    }

    info!(
        endpoint,
        rows = rows.yielded(),
        enqueued,
        "📥 Aggregation feed finished"
    );
    Ok(enqueued)
}
