mod common;

use ahjo_sync::constants::queues;
use ahjo_sync::source::{enqueue_changed_rows, AhjoSourceIterator, SourceError, SourceOptions};
use common::*;
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;

const LISTING: &str = "https://ahjo.example.test/ahjo-proxy/meetings?limit=50&offset=10&orderby=-modified";

fn offsets(urls: &[String]) -> Vec<u64> {
    urls.iter()
        .map(|url| {
            url::Url::parse(url)
                .unwrap()
                .query_pairs()
                .find(|(key, _)| key == "offset")
                .and_then(|(_, value)| value.parse().ok())
                .unwrap()
        })
        .collect()
}

fn partial(threshold: u32) -> SourceOptions {
    SourceOptions {
        partial: true,
        unchanged_threshold: threshold,
        ..SourceOptions::default()
    }
}

async fn collect_ids(iterator: &AhjoSourceIterator) -> Vec<String> {
    let mut rows = iterator.rows();
    let mut ids = Vec::new();
    while let Some(row) = rows.next().await {
        ids.push(row.unwrap().data["id"].as_str().unwrap().to_string());
    }
    ids
}

#[tokio::test]
async fn test_count_and_urls() {
    let pages = Arc::new(ListingPages::new(210, 50));
    let iterator = AhjoSourceIterator::new(pages.clone(), LISTING, SourceOptions::default()).unwrap();

    assert_eq!(iterator.count().await.unwrap(), 200);
    let urls = iterator.build_urls().await.unwrap();
    assert_eq!(offsets(&urls), vec![10, 60, 110, 160]);
    assert!(urls.iter().all(|url| url.contains("orderby=-modified")));
    assert!(urls.iter().all(|url| url.contains("limit=50")));
}

#[tokio::test]
async fn test_page_cap_clamps_count_and_urls() {
    let pages = Arc::new(ListingPages::new(210, 50));
    let options = SourceOptions {
        limit_pages: Some(2),
        ..SourceOptions::default()
    };
    let iterator = AhjoSourceIterator::new(pages, LISTING, options).unwrap();

    assert_eq!(iterator.count().await.unwrap(), 100);
    assert_eq!(offsets(&iterator.build_urls().await.unwrap()), vec![10, 60]);
}

#[tokio::test]
async fn test_missing_metadata_is_configuration_error() {
    let pages = Arc::new(StaticPages::new().page(
        LISTING,
        json!({"meta": {"limit": 50, "total_count": 210}, "objects": []}),
    ));
    let iterator = AhjoSourceIterator::new(pages, LISTING, SourceOptions::default()).unwrap();

    let err = iterator.count().await.unwrap_err();
    assert!(matches!(err, SourceError::MissingMetadata { field: "offset", .. }));
    assert!(err.is_configuration_error());

    let mut rows = iterator.rows();
    assert!(matches!(rows.next().await, Some(Err(SourceError::MissingMetadata { .. }))));
    assert!(rows.next().await.is_none());
}

#[tokio::test]
async fn test_full_walk_in_order() {
    let pages = Arc::new(ListingPages::new(210, 50));
    let iterator = AhjoSourceIterator::new(pages.clone(), LISTING, SourceOptions::default()).unwrap();

    let ids = collect_ids(&iterator).await;
    let expected: Vec<String> = (10..210).map(|n| n.to_string()).collect();
    assert_eq!(ids, expected);
    assert_eq!(pages.fetched().len(), 4);
}

#[tokio::test]
async fn test_early_stop_after_unchanged_run() {
    let pages = Arc::new(ListingPages::new(210, 50));
    let iterator = AhjoSourceIterator::new(pages.clone(), LISTING, partial(20))
        .unwrap()
        .with_change_detector(Arc::new(SetChangeDetector::range(10..210)));

    let ids = collect_ids(&iterator).await;
    let expected: Vec<String> = (10..30).map(|n| n.to_string()).collect();
    assert_eq!(ids, expected);
    assert_eq!(pages.fetched().len(), 1);
}

#[tokio::test]
async fn test_early_stop_crosses_page_boundaries() {
    // Rows 10..40 changed, everything after unchanged: the run of 20 ends at row 59
    let pages = Arc::new(ListingPages::new(210, 50));
    let iterator = AhjoSourceIterator::new(pages.clone(), LISTING, partial(20))
        .unwrap()
        .with_change_detector(Arc::new(SetChangeDetector::range(40..210)));

    let ids = collect_ids(&iterator).await;
    assert_eq!(ids.len(), 50);
    assert_eq!(ids.last().map(String::as_str), Some("59"));
    assert_eq!(pages.fetched().len(), 1);

    // One more unchanged row needed on the next page
    let iterator = AhjoSourceIterator::new(pages.clone(), LISTING, partial(20))
        .unwrap()
        .with_change_detector(Arc::new(SetChangeDetector::range(41..210)));
    let ids = collect_ids(&iterator).await;
    assert_eq!(ids.last().map(String::as_str), Some("60"));
    assert_eq!(pages.fetched().len(), 3);
}

#[tokio::test]
async fn test_changed_row_resets_the_counter() {
    let unchanged = (10..29).chain(30..49).map(|n| n.to_string());
    let pages = Arc::new(ListingPages::new(60, 50));
    let iterator = AhjoSourceIterator::new(pages, LISTING, partial(20))
        .unwrap()
        .with_change_detector(Arc::new(SetChangeDetector::new(unchanged)));

    let ids = collect_ids(&iterator).await;
    assert_eq!(ids.len(), 50);
}

#[tokio::test]
async fn test_full_mode_ignores_detector() {
    let pages = Arc::new(ListingPages::new(100, 50));
    let iterator = AhjoSourceIterator::new(pages, LISTING, SourceOptions::default())
        .unwrap()
        .with_change_detector(Arc::new(SetChangeDetector::range(0..100)));

    let mut rows = iterator.rows();
    let mut count = 0;
    while let Some(row) = rows.next().await {
        assert!(row.unwrap().changed);
        count += 1;
    }
    assert_eq!(count, 90);
}

#[tokio::test]
async fn test_max_items_cap() {
    let pages = Arc::new(ListingPages::new(210, 50));
    let options = SourceOptions {
        max_items: Some(75),
        ..SourceOptions::default()
    };
    let iterator = AhjoSourceIterator::new(pages.clone(), LISTING, options).unwrap();

    assert_eq!(collect_ids(&iterator).await.len(), 75);
    assert_eq!(pages.fetched().len(), 2);
}

#[tokio::test]
async fn test_walk_restarts_on_reinvocation() {
    let pages = Arc::new(ListingPages::new(60, 50));
    let iterator = AhjoSourceIterator::new(pages, LISTING, SourceOptions::default()).unwrap();

    let first: Vec<_> = iterator.rows().into_stream().collect().await;
    let second: Vec<_> = iterator.rows().into_stream().collect().await;
    assert_eq!(first.len(), 50);
    assert_eq!(first.len(), second.len());
}

#[tokio::test]
async fn test_invalid_url() {
    let pages = Arc::new(ListingPages::new(1, 1));
    assert!(matches!(
        AhjoSourceIterator::new(pages, "not a url", SourceOptions::default()),
        Err(SourceError::InvalidUrl { .. })
    ));
}

#[tokio::test]
async fn test_enqueue_changed_rows_feeds_aggregation_queue() {
    let pages = Arc::new(ListingPages::new(60, 50));
    let iterator = AhjoSourceIterator::new(pages, LISTING, partial(20))
        .unwrap()
        .with_change_detector(Arc::new(SetChangeDetector::range(15..60)));
    let proxy = MockProxy::new();

    let enqueued = enqueue_changed_rows(&iterator, &proxy, "meetings", "id")
        .await
        .unwrap();

    assert_eq!(enqueued, 5);
    let added = proxy.added();
    assert_eq!(added.len(), 5);
    assert_eq!(
        added[0],
        ProxyCall::Add {
            queue: queues::AGGREGATION.to_string(),
            entity_id: "10".to_string(),
            endpoint: "meetings".to_string(),
            update_type: "Updated".to_string()
        }
    );
}

#[tokio::test]
async fn test_enqueue_changed_rows_skips_queued_and_reports_failures() {
    let pages = Arc::new(ListingPages::new(20, 50));
    let iterator = AhjoSourceIterator::new(pages, LISTING, SourceOptions::default()).unwrap();

    let proxy = MockProxy::new();
    proxy.set_already_queued(true);
    assert_eq!(
        enqueue_changed_rows(&iterator, &proxy, "meetings", "id").await.unwrap(),
        0
    );
    assert!(proxy.added().is_empty());

    let proxy = MockProxy::new();
    proxy.set_enqueue_fails(true);
    assert!(matches!(
        enqueue_changed_rows(&iterator, &proxy, "meetings", "id").await,
        Err(SourceError::Enqueue { .. })
    ));
}
