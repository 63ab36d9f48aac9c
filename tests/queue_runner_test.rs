mod common;

use ahjo_sync::config::QueueConfig;
use ahjo_sync::constants::queues;
use ahjo_sync::messaging::{AhjoQueueMessage, InMemoryQueueBackend, QueueBackend};
use ahjo_sync::worker::{QueueRunner, QueueWorkerConfig, RunSummary};
use chrono::Utc;
use common::*;
use std::sync::Arc;
use std::time::Duration;

const LEASE: Duration = Duration::from_secs(300);

async fn seed(backend: &InMemoryQueueBackend, queue: &str, items: &[AhjoQueueMessage]) {
    for item in items {
        backend.create_item(queue, item).await.unwrap();
    }
}

fn runner(proxy: &Arc<MockProxy>, backend: &Arc<InMemoryQueueBackend>) -> QueueRunner {
    QueueRunner::new(proxy.clone(), backend.clone(), LEASE)
}

#[tokio::test]
async fn test_successful_items_are_deleted() {
    let proxy = Arc::new(MockProxy::new());
    let backend = Arc::new(InMemoryQueueBackend::new());
    seed(
        &backend,
        queues::SUBSCRIBER,
        &[
            AhjoQueueMessage::new("decisions", "D1", "Added"),
            AhjoQueueMessage::new("decisions", "D2", "Added"),
        ],
    )
    .await;

    let summary = runner(&proxy, &backend)
        .run(&QueueWorkerConfig::subscriber(&QueueConfig::default()))
        .await
        .unwrap();

    assert_eq!(
        summary,
        RunSummary {
            claimed: 2,
            migrated: 2,
            ..RunSummary::default()
        }
    );
    assert_eq!(backend.number_of_items(queues::SUBSCRIBER).await.unwrap(), 0);
}

#[tokio::test]
async fn test_retryable_items_stay_leased() {
    let proxy = Arc::new(MockProxy::new());
    proxy.set_migrate_status(0);
    let backend = Arc::new(InMemoryQueueBackend::new());
    let fresh = AhjoQueueMessage::new("cases", "C1", "Added").with_created(Utc::now().timestamp());
    seed(&backend, queues::AGGREGATION, &[fresh]).await;

    let config = QueueWorkerConfig::aggregation(&QueueConfig::default());
    let summary = runner(&proxy, &backend).run(&config).await.unwrap();

    assert_eq!(summary.claimed, 1);
    assert_eq!(summary.retried, 1);
    assert_eq!(backend.number_of_items(queues::AGGREGATION).await.unwrap(), 1);
    assert!(backend
        .claim_item(queues::AGGREGATION, LEASE)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_expired_items_move_down_the_chain() {
    let proxy = Arc::new(MockProxy::new());
    proxy.set_migrate_status(0);
    let backend = Arc::new(InMemoryQueueBackend::new());
    seed(
        &backend,
        queues::AGGREGATION,
        &[AhjoQueueMessage::new("cases", "C1", "Added")],
    )
    .await;

    let summary = runner(&proxy, &backend)
        .run(&QueueWorkerConfig::aggregation(&QueueConfig::default()))
        .await
        .unwrap();

    assert_eq!(summary.rerouted, 1);
    assert_eq!(backend.number_of_items(queues::AGGREGATION).await.unwrap(), 0);
    assert_eq!(
        proxy.added(),
        vec![ProxyCall::Add {
            queue: queues::RETRY.to_string(),
            entity_id: "C1".to_string(),
            endpoint: "cases".to_string(),
            update_type: "Added - ahjo_api_aggregation_queue".to_string()
        }]
    );
}

#[tokio::test]
async fn test_suspend_releases_item_and_stops() {
    let proxy = Arc::new(MockProxy::new());
    proxy.set_operational(false);
    let backend = Arc::new(InMemoryQueueBackend::new());
    seed(
        &backend,
        queues::RETRY,
        &[
            AhjoQueueMessage::new("cases", "C1", "Added"),
            AhjoQueueMessage::new("cases", "C2", "Added"),
        ],
    )
    .await;

    let summary = runner(&proxy, &backend)
        .run(&QueueWorkerConfig::retry(&QueueConfig::default()))
        .await
        .unwrap();

    assert!(summary.suspended);
    assert_eq!(summary.claimed, 1);
    assert_eq!(proxy.migrations(), 0);
    assert_eq!(backend.number_of_items(queues::RETRY).await.unwrap(), 2);

    let first = backend.claim_item(queues::RETRY, LEASE).await.unwrap().unwrap();
    assert_eq!(first.data.entity_id(), "C1");
}

#[tokio::test]
async fn test_fatal_failure_does_not_stop_the_run() {
    let proxy = Arc::new(MockProxy::new());
    proxy.set_migrate_status(0);
    let backend = Arc::new(InMemoryQueueBackend::new());
    let fresh = Utc::now().timestamp();
    seed(
        &backend,
        queues::ERROR,
        &[
            AhjoQueueMessage::new("cases", "C1", "Added - ahjo_api_retry_queue"),
            AhjoQueueMessage::new("cases", "C2", "Added - ahjo_api_retry_queue").with_created(fresh),
            AhjoQueueMessage::new("cases", "C3", "Added - ahjo_api_retry_queue").with_created(fresh),
        ],
    )
    .await;

    let summary = runner(&proxy, &backend)
        .run(&QueueWorkerConfig::error(&QueueConfig::default()))
        .await
        .unwrap();

    assert_eq!(summary.claimed, 3);
    assert_eq!(summary.retried, 2);
    assert!(summary.has_fatal());
    assert_eq!(summary.fatal.len(), 1);
    assert_eq!(summary.fatal[0].entity_id, "C1");
    assert!(!summary.suspended);
    assert_eq!(proxy.migrations(), 3);

    // Every item stays leased, the fatal one included
    assert_eq!(backend.number_of_items(queues::ERROR).await.unwrap(), 3);
    assert!(backend
        .claim_item(queues::ERROR, LEASE)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_max_items_caps_the_run() {
    let proxy = Arc::new(MockProxy::new());
    let backend = Arc::new(InMemoryQueueBackend::new());
    let items: Vec<_> = (0..5)
        .map(|n| AhjoQueueMessage::new("decisions", format!("D{n}"), "Added"))
        .collect();
    seed(&backend, queues::AGGREGATION, &items).await;

    let summary = runner(&proxy, &backend)
        .with_max_items(3)
        .run(&QueueWorkerConfig::aggregation(&QueueConfig::default()))
        .await
        .unwrap();

    assert_eq!(summary.claimed, 3);
    assert_eq!(backend.number_of_items(queues::AGGREGATION).await.unwrap(), 2);
}

#[tokio::test]
async fn test_empty_queue() {
    let proxy = Arc::new(MockProxy::new());
    let backend = Arc::new(InMemoryQueueBackend::new());

    let summary = runner(&proxy, &backend)
        .run(&QueueWorkerConfig::subscriber(&QueueConfig::default()))
        .await
        .unwrap();

    assert_eq!(summary, RunSummary::default());
    assert!(proxy.calls().is_empty());
}
