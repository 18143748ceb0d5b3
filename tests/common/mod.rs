#![allow(dead_code)]

use quote_sync::SyncConfig;
use quote_sync::quotes::{Quote, QuoteId};
use quote_sync::remote::{
	Delivery, DeliveryStrategy, OfflineTransport, PushAck, PushTransport, RemoteError,
	RemoteGateway, RemoteSource,
};
use quote_sync::storage::{KeyValueStore, MemoryKeyValueStore, StorageError};
use quote_sync::sync::{ChannelEventHandler, PendingChange, SyncEvent, SyncOrchestrator};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::sync::mpsc::UnboundedReceiver;

pub fn quote(id: u64, text: &str, category: &str) -> Quote {
	Quote::new(text, category).with_id(QuoteId::Numeric(id))
}

pub fn fast_config() -> SyncConfig {
	SyncConfig {
		retry_initial_interval: Duration::from_millis(1),
		..SyncConfig::default()
	}
}

/// Remote serving a fixed record set, counting fetches
#[derive(Clone)]
pub struct StaticSource {
	pub quotes: Vec<Quote>,
	pub calls: Arc<AtomicUsize>,
}

impl StaticSource {
	pub fn new(quotes: Vec<Quote>) -> Self {
		Self {
			quotes,
			calls: Arc::new(AtomicUsize::new(0)),
		}
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait::async_trait]
impl RemoteSource for StaticSource {
	async fn fetch_snapshot(&self) -> Result<Vec<Quote>, RemoteError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		Ok(self.quotes.clone())
	}

	fn name(&self) -> &'static str {
		"StaticSource"
	}
}

/// Remote that is always down, counting fetches
#[derive(Clone, Default)]
pub struct FailingSource {
	pub calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl RemoteSource for FailingSource {
	async fn fetch_snapshot(&self) -> Result<Vec<Quote>, RemoteError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		Err(RemoteError::Unavailable("connection refused".to_string()))
	}

	fn name(&self) -> &'static str {
		"FailingSource"
	}
}

/// Remote that never answers within any reasonable timeout
pub struct HangingSource;

#[async_trait::async_trait]
impl RemoteSource for HangingSource {
	async fn fetch_snapshot(&self) -> Result<Vec<Quote>, RemoteError> {
		tokio::time::sleep(Duration::from_secs(3600)).await;
		Ok(Vec::new())
	}

	fn name(&self) -> &'static str {
		"HangingSource"
	}
}

/// Remote that signals `entered` and waits for `release` before answering
#[derive(Clone)]
pub struct GatedSource {
	pub quotes: Vec<Quote>,
	pub entered: Arc<Notify>,
	pub release: Arc<Notify>,
	pub calls: Arc<AtomicUsize>,
}

impl GatedSource {
	pub fn new(quotes: Vec<Quote>) -> Self {
		Self {
			quotes,
			entered: Arc::new(Notify::new()),
			release: Arc::new(Notify::new()),
			calls: Arc::new(AtomicUsize::new(0)),
		}
	}
}

#[async_trait::async_trait]
impl RemoteSource for GatedSource {
	async fn fetch_snapshot(&self) -> Result<Vec<Quote>, RemoteError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.entered.notify_one();
		self.release.notified().await;
		Ok(self.quotes.clone())
	}

	fn name(&self) -> &'static str {
		"GatedSource"
	}
}

/// Network transport recording batch sizes; optionally failing or gated
#[derive(Clone)]
pub struct RecordingTransport {
	pub batches: Arc<Mutex<Vec<Vec<PendingChange>>>>,
	pub fail: bool,
	pub gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl RecordingTransport {
	pub fn accepting() -> Self {
		Self {
			batches: Arc::new(Mutex::new(Vec::new())),
			fail: false,
			gate: None,
		}
	}

	pub fn failing() -> Self {
		Self {
			fail: true,
			..Self::accepting()
		}
	}

	/// Accepting transport that signals the first handle on entry and waits for the second
	pub fn gated() -> (Self, Arc<Notify>, Arc<Notify>) {
		let entered = Arc::new(Notify::new());
		let release = Arc::new(Notify::new());
		let transport = Self {
			gate: Some((entered.clone(), release.clone())),
			..Self::accepting()
		};
		(transport, entered, release)
	}

	pub fn batches(&self) -> Vec<Vec<PendingChange>> {
		self.batches.lock().unwrap().clone()
	}
}

#[async_trait::async_trait]
impl PushTransport for RecordingTransport {
	async fn push(&self, changes: &[PendingChange]) -> Result<PushAck, RemoteError> {
		if let Some((entered, release)) = &self.gate {
			entered.notify_one();
			release.notified().await;
		}
		self.batches.lock().unwrap().push(changes.to_vec());
		if self.fail {
			return Err(RemoteError::Status(500));
		}
		Ok(PushAck {
			delivery: Delivery::Remote,
			received: changes.len(),
			message: "ok".to_string(),
		})
	}

	fn name(&self) -> &'static str {
		"RecordingTransport"
	}
}

/// Memory store whose reads of one key fail with an IO error
pub struct UnreadableKey {
	pub inner: MemoryKeyValueStore,
	pub key: &'static str,
}

#[async_trait::async_trait]
impl KeyValueStore for UnreadableKey {
	async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
		if key == self.key {
			return Err(std::io::Error::other("input/output error").into());
		}
		self.inner.get(key).await
	}

	async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
		self.inner.set(key, value).await
	}

	async fn remove(&self, key: &str) -> Result<(), StorageError> {
		self.inner.remove(key).await
	}
}

pub fn instant_offline() -> Box<OfflineTransport> {
	Box::new(OfflineTransport::new().with_latency(Duration::ZERO..=Duration::ZERO))
}

pub fn gateway(
	source: impl RemoteSource + 'static,
	network: impl PushTransport + 'static,
	strategy: DeliveryStrategy,
) -> RemoteGateway {
	RemoteGateway::new(Box::new(source), Box::new(network), instant_offline(), strategy)
}

pub async fn orchestrator(
	storage: &MemoryKeyValueStore,
	gateway: RemoteGateway,
	config: SyncConfig,
) -> (Arc<SyncOrchestrator>, UnboundedReceiver<SyncEvent>) {
	let orchestrator = SyncOrchestrator::restore(Arc::new(storage.clone()), gateway, config)
		.await
		.unwrap();
	let (handler, receiver) = ChannelEventHandler::new();
	orchestrator.register_handler(Box::new(handler)).await;
	(Arc::new(orchestrator), receiver)
}

pub fn drain(receiver: &mut UnboundedReceiver<SyncEvent>) -> Vec<SyncEvent> {
	let mut events = Vec::new();
	while let Ok(event) = receiver.try_recv() {
		events.push(event);
	}
	events
}
