mod common;

use common::*;
use quote_sync::remote::DeliveryStrategy;
use quote_sync::storage::MemoryKeyValueStore;
use quote_sync::sync::SyncScheduler;

use std::time::Duration;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn test_startup_then_periodic_triggers() {
	let storage = MemoryKeyValueStore::new();
	let source = StaticSource::new(vec![quote(1, "A", "X")]);
	let (orchestrator, _receiver) = orchestrator(
		&storage,
		gateway(source.clone(), RecordingTransport::accepting(), DeliveryStrategy::Strict),
		fast_config(),
	)
	.await;

	let mut scheduler = SyncScheduler::start(orchestrator.clone());
	assert!(scheduler.is_running());

	sleep(Duration::from_millis(1_900)).await;
	assert_eq!(source.calls(), 0);

	sleep(Duration::from_millis(200)).await;
	assert_eq!(source.calls(), 1);

	// First periodic tick lands 30 s after start
	sleep(Duration::from_secs(27)).await;
	assert_eq!(source.calls(), 1);
	sleep(Duration::from_secs(1)).await;
	assert_eq!(source.calls(), 2);

	sleep(Duration::from_secs(30)).await;
	assert_eq!(source.calls(), 3);

	scheduler.stop();
	assert!(!scheduler.is_running());
	sleep(Duration::from_secs(120)).await;
	assert_eq!(source.calls(), 3);
	assert!(orchestrator.status().await.last_sync_time.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_scheduler_stops_triggers() {
	let storage = MemoryKeyValueStore::new();
	let source = StaticSource::new(Vec::new());
	let (orchestrator, _receiver) = orchestrator(
		&storage,
		gateway(source.clone(), RecordingTransport::accepting(), DeliveryStrategy::Strict),
		fast_config(),
	)
	.await;

	let scheduler = SyncScheduler::start(orchestrator);
	sleep(Duration::from_secs(3)).await;
	assert_eq!(source.calls(), 1);

	drop(scheduler);
	sleep(Duration::from_secs(90)).await;
	assert_eq!(source.calls(), 1);
}
