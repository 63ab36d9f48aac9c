//! # Pagination Cursor
//!
//! Offset pagination as served by the Ahjo API:
//!
//! ```json
//! {"meta": {"limit": 50, "offset": 10, "total_count": 210}, "objects": [...]}
//! ```

use super::error::{SourceError, SourceResult};
use serde_json::Value;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationCursor {
    pub limit: u64,
    pub offset: u64,
    pub total_count: u64,
}

fn meta_field(meta: &Value, field: &'static str, url: &str) -> SourceResult<u64> {
    let value = meta
        .get(field)
        .filter(|value| !value.is_null())
        .ok_or_else(|| SourceError::missing_metadata(field, url))?;

    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| {
            SourceError::invalid_metadata(field, url, format!("not a non-negative integer: {value}"))
        })
}

impl PaginationCursor {
    /// Read the cursor from the `meta` object of a page body
    pub fn from_page(body: &Value, url: &str) -> SourceResult<Self> {
        let meta = body
            .get("meta")
            .ok_or_else(|| SourceError::missing_metadata("meta", url))?;

        let cursor = Self {
            limit: meta_field(meta, "limit", url)?,
            offset: meta_field(meta, "offset", url)?,
            total_count: meta_field(meta, "total_count", url)?,
        };

        if cursor.limit == 0 {
            return Err(SourceError::invalid_metadata("limit", url, "page size is zero"));
        }
        Ok(cursor)
    }

    /// Rows still to be read from `offset`, clamped to `limit_pages` pages
    pub fn effective_count(&self, limit_pages: Option<u64>) -> u64 {
        let remaining = self.total_count.saturating_sub(self.offset);
        match limit_pages {
            Some(pages) => remaining.min(pages.saturating_mul(self.limit)),
            None => remaining,
        }
    }

    pub fn page_count(&self, limit_pages: Option<u64>) -> u64 {
        self.effective_count(limit_pages).div_ceil(self.limit)
    }

    /// One URL per page, stepping `offset` by `limit` and keeping every other
    /// query parameter of `base` as is
    pub fn build_urls(&self, base: &Url, limit_pages: Option<u64>) -> Vec<Url> {
        (0..self.page_count(limit_pages))
            .map(|page| with_offset(base, self.offset + page * self.limit))
            .collect()
    }
}

fn with_offset(base: &Url, offset: u64) -> Url {
    let offset = offset.to_string();
    let mut replaced = false;
    let pairs: Vec<(String, String)> = base
        .query_pairs()
        .map(|(key, value)| {
            if key == "offset" {
                replaced = true;
                (key.into_owned(), offset.clone())
            } else {
                (key.into_owned(), value.into_owned())
            }
        })
        .collect();

    let mut url = base.clone();
    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.extend_pairs(&pairs);
        if !replaced {
            query.append_pair("offset", &offset);
        }
    }
    url
}
