//! Quote sync orchestrator and integration point for all sync services.
//!
//! `SyncOrchestrator` owns the local quote context (record store and pending-change queue), the
//! sync state and the remote gateway, and runs sync cycles against them. A cycle fetches the
//! remote record set, reports conflicts, merges remote-wins into the store, then delivers pending
//! changes. Cycles never overlap, and the context lock is never held across remote I/O or event
//! dispatch.
//!
//! The orchestrator is also the entry point for UI-facing quote operations, so that every local
//! mutation is queued for delivery in the same critical section that applies it. Results are
//! reported through the event system rather than returned to a renderer.

use crate::config::SyncConfig;
use crate::quotes::{CategoryFilter, IdentityPolicy, Quote};
use crate::remote::{RemoteError, RemoteGateway};
use crate::storage::{KeyValueStore, LAST_SYNC_KEY, LAST_VIEWED_KEY, read_or_absent};
use crate::sync::{
	conflict::detect_conflicts,
	context::QuoteContext,
	events::{EventDispatcher, Severity, SyncEvent, SyncEventHandler, SyncStatus},
	merge::merge_remote_wins,
	report::{SyncOutcome, SyncReport},
	state::{CycleGuard, SyncState, lock_state},
	types::{ChangeKind, ChangePayload, PendingChange, SyncError},
};

use backoff::{ExponentialBackoffBuilder, future::retry};
use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Main sync orchestrator that coordinates the record store, queue and remote gateway.
pub struct SyncOrchestrator {
	context: Mutex<QuoteContext>,
	state: StdMutex<SyncState>,
	events: Mutex<EventDispatcher>,
	gateway: RemoteGateway,
	storage: Arc<dyn KeyValueStore>,
	config: SyncConfig,
	identity: IdentityPolicy,
}

impl SyncOrchestrator {
	/// Restore quotes, pending changes and the last sync time from `storage`.
	///
	/// Fails if quotes or pending changes cannot be read, leaving the stored data untouched.
	pub async fn restore(
		storage: Arc<dyn KeyValueStore>,
		gateway: RemoteGateway,
		config: SyncConfig,
	) -> Result<Self, SyncError> {
		let context = QuoteContext::restore(storage.clone()).await?;
		let state = SyncState::restore(storage.as_ref()).await;

		info!(
			"Restored {} quotes and {} pending changes",
			context.store.len(),
			context.queue.len()
		);

		Ok(Self {
			context: Mutex::new(context),
			state: StdMutex::new(state),
			events: Mutex::new(EventDispatcher::new()),
			gateway,
			storage,
			config,
			identity: IdentityPolicy::default(),
		})
	}

	/// Set how locally created quotes get their identity
	pub fn with_identity(mut self, identity: IdentityPolicy) -> Self {
		self.identity = identity;
		self
	}

	pub fn config(&self) -> &SyncConfig {
		&self.config
	}

	/// Register an observer for sync events.
	///
	/// Handlers are called in the order they are registered. No quote lock is held while they
	/// run, so a handler may read orchestrator state. It must not call operations that emit
	/// events themselves.
	pub async fn register_handler(&self, handler: Box<dyn SyncEventHandler>) {
		self.events.lock().await.register_handler(handler);
	}

	/// Run one sync cycle unless one is already running.
	///
	/// Failures never propagate: they are logged, reported as an error notification and returned
	/// as `SyncOutcome::Failed`.
	pub async fn sync_now(&self) -> SyncOutcome {
		let Some(guard) = CycleGuard::try_begin(&self.state) else {
			debug!("Sync already in progress, skipping trigger");
			return SyncOutcome::Skipped;
		};

		self.notify("Syncing with server...", Severity::Info).await;
		self.publish_status().await;

		let outcome = match self.run_cycle().await {
			Ok(report) => {
				info!("Sync completed: {}", report.summary());
				SyncOutcome::Completed(report)
			}
			Err(e) => {
				error!("Sync failed: {}", e);
				self.notify(format!("Sync failed: {}", e), Severity::Error)
					.await;
				SyncOutcome::Failed(e)
			}
		};

		drop(guard);
		self.publish_status().await;
		outcome
	}

	async fn run_cycle(&self) -> Result<SyncReport, SyncError> {
		let remote = self.fetch_with_retry().await.map_err(SyncError::Fetch)?;
		lock_state(&self.state).last_server_snapshot = Some(remote.clone());

		let mut events = Vec::new();
		let (conflicts, merged_total, displayed) = {
			let mut context = self.context.lock().await;

			let conflicts = detect_conflicts(context.store.quotes(), &remote);
			if !conflicts.is_empty() {
				for conflict in &conflicts {
					info!(
						"Conflict on {}: keeping server version ({:?} instead of {:?})",
						conflict.key, conflict.remote.category, conflict.local.category
					);
				}
				events.push(SyncEvent::notification(
					format!("Found {} conflicts. Resolving...", conflicts.len()),
					Severity::Warning,
				));
				events.push(SyncEvent::ConflictsResolved(conflicts.clone()));
			}

			let merged = merge_remote_wins(context.store.quotes(), &remote);
			let merged_total = merged.len();
			context.store.replace(merged).await?;
			context.store.revalidate_filter().await?;

			(conflicts.len(), merged_total, context.store.random_quote().cloned())
		};

		for event in events {
			self.emit(event).await;
		}
		if let Some(quote) = displayed {
			self.display(quote).await;
		}

		let mut report = SyncReport {
			fetched: remote.len(),
			conflicts,
			merged_total,
			pushed: 0,
			delivery: None,
			push_error: None,
			completed_at: Utc::now(),
		};

		let batch = self.context.lock().await.queue.begin_flush();
		if let Some(batch) = batch {
			match batch.push(&self.gateway, self.config.push_timeout).await {
				Ok(ack) => {
					report.pushed = self
						.context
						.lock()
						.await
						.queue
						.complete_flush(&batch)
						.await?;
					report.delivery = Some(ack.delivery);
					if ack.is_degraded() {
						self.notify(
							format!(
								"Server unreachable, {} changes acknowledged locally",
								ack.received
							),
							Severity::Warning,
						)
						.await;
					}
				}
				Err(e) => {
					warn!("Failed to push {} pending changes: {}", batch.len(), e);
					self.notify(
						format!("Could not push {} pending changes: {}", batch.len(), e),
						Severity::Warning,
					)
					.await;
					report.push_error = Some(e.to_string());
				}
			}
		}

		let now = Utc::now();
		self.storage
			.set(LAST_SYNC_KEY, &now.timestamp_millis().to_string())
			.await?;
		lock_state(&self.state).last_sync_time = Some(now);
		report.completed_at = now;

		self.notify("Quotes synced with server!", Severity::Success)
			.await;
		Ok(report)
	}

	/// Fetch the remote set, retrying with exponential backoff up to `fetch_attempts` times
	async fn fetch_with_retry(&self) -> Result<Vec<Quote>, RemoteError> {
		let max_attempts = self.config.fetch_attempts.max(1);
		let timeout = self.config.fetch_timeout;
		let attempts = AtomicU32::new(0);
		let backoff = ExponentialBackoffBuilder::new()
			.with_initial_interval(self.config.retry_initial_interval)
			.with_max_elapsed_time(None)
			.build();

		let attempts = &attempts;
		let gateway = &self.gateway;
		retry(backoff, move || async move {
			let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
			let result = match tokio::time::timeout(timeout, gateway.fetch_remote()).await {
				Ok(result) => result,
				Err(_) => Err(RemoteError::Timeout(timeout)),
			};

			result.map_err(|e| {
				if attempt >= max_attempts {
					backoff::Error::permanent(e)
				} else {
					warn!("Fetch attempt {}/{} failed: {}", attempt, max_attempts, e);
					backoff::Error::transient(e)
				}
			})
		})
		.await
	}

	/// Validate, store and queue a new quote
	pub async fn add_quote(&self, text: &str, category: &str) -> Result<Quote, SyncError> {
		let result = async {
			let mut context = self.context.lock().await;
			let before = context.store.quotes().to_vec();
			let quote = context.store.add(text, category, self.identity).await?;
			context
				.record(before, ChangeKind::Add, ChangePayload::Record(quote.clone()))
				.await?;
			Ok::<_, SyncError>((quote, context.queue.len()))
		}
		.await;

		let (quote, pending) = self.report_failure(result).await?;
		self.notify("Quote added successfully!", Severity::Success)
			.await;
		self.display(quote.clone()).await;
		self.publish_status_with(pending).await;
		Ok(quote)
	}

	/// Edit the quote at `index` and queue the change with both versions
	pub async fn edit_quote(
		&self,
		index: usize,
		text: &str,
		category: &str,
	) -> Result<Quote, SyncError> {
		let result = async {
			let mut context = self.context.lock().await;
			let before = context.store.quotes().to_vec();
			let (old, new) = context.store.edit(index, text, category).await?;
			context
				.record(
					before,
					ChangeKind::Update,
					ChangePayload::Pair {
						old,
						new: new.clone(),
					},
				)
				.await?;
			context.store.revalidate_filter().await?;
			Ok::<_, SyncError>((new, context.queue.len()))
		}
		.await;

		let (quote, pending) = self.report_failure(result).await?;
		self.notify("Quote updated successfully!", Severity::Success)
			.await;
		self.publish_status_with(pending).await;
		Ok(quote)
	}

	/// Remove the quote at `index` and queue its deletion
	pub async fn remove_quote(&self, index: usize) -> Result<Quote, SyncError> {
		let result = async {
			let mut context = self.context.lock().await;
			let before = context.store.quotes().to_vec();
			let removed = context.store.remove(index).await?;
			context
				.record(before, ChangeKind::Delete, ChangePayload::Record(removed.clone()))
				.await?;
			context.store.revalidate_filter().await?;
			Ok::<_, SyncError>((removed, context.queue.len()))
		}
		.await;

		let (removed, pending) = self.report_failure(result).await?;
		self.notify("Quote removed successfully!", Severity::Success)
			.await;
		self.publish_status_with(pending).await;
		Ok(removed)
	}

	/// Append quotes from a JSON export; imported quotes are not queued for delivery
	pub async fn import_quotes(&self, json: &str) -> Result<usize, SyncError> {
		let result = async {
			let mut context = self.context.lock().await;
			let count = context.store.import_json(json).await?;
			Ok::<_, SyncError>((count, context.store.random_quote().cloned()))
		}
		.await;

		let (count, displayed) = self.report_failure(result).await?;
		self.notify("Quotes imported successfully!", Severity::Success)
			.await;
		if let Some(quote) = displayed {
			self.display(quote).await;
		}
		self.publish_status().await;
		Ok(count)
	}

	/// Pretty-printed JSON array of all quotes
	pub async fn export_quotes(&self) -> Result<String, SyncError> {
		let result = self
			.context
			.lock()
			.await
			.store
			.export_json()
			.map_err(SyncError::from);

		let json = self.report_failure(result).await?;
		self.notify("Quotes exported successfully!", Severity::Success)
			.await;
		self.publish_status().await;
		Ok(json)
	}

	/// Select the category filter and display a quote from it
	pub async fn set_category_filter(&self, value: &str) -> Result<CategoryFilter, SyncError> {
		let filter = CategoryFilter::parse(value);
		let result = async {
			let mut context = self.context.lock().await;
			context.store.set_filter(filter.clone()).await?;
			Ok::<_, SyncError>(context.store.random_quote().cloned())
		}
		.await;

		let displayed = self.report_failure(result).await?;
		match displayed {
			Some(quote) => self.display(quote).await,
			None => self.notify_empty_filter().await,
		}
		let message = match &filter {
			CategoryFilter::All => "Showing quotes from all categories".to_string(),
			CategoryFilter::Category(category) => format!("Filtered to {} quotes", category),
		};
		self.notify(message, Severity::Success).await;
		self.publish_status().await;
		Ok(filter)
	}

	/// Pick a random quote within the current filter and display it
	pub async fn show_random_quote(&self) -> Option<Quote> {
		let quote = self.context.lock().await.store.random_quote().cloned();
		match &quote {
			Some(quote) => self.display(quote.clone()).await,
			None => self.notify_empty_filter().await,
		}
		self.publish_status().await;
		quote
	}

	/// Display the last viewed quote if one was saved, otherwise a random one
	pub async fn show_startup_quote(&self) -> Option<Quote> {
		let saved = read_or_absent(self.storage.as_ref(), LAST_VIEWED_KEY)
			.await
			.and_then(|content| match serde_json::from_str::<Quote>(&content) {
				Ok(quote) => Some(quote),
				Err(e) => {
					debug!("Ignoring unreadable last viewed quote: {}", e);
					None
				}
			})
			.filter(|quote| !quote.text.is_empty() && !quote.category.is_empty());

		match saved {
			Some(quote) => {
				debug!("Showing last viewed quote {}", quote.key());
				self.emit(SyncEvent::QuoteDisplayed(quote.clone())).await;
				self.publish_status().await;
				Some(quote)
			}
			None => self.show_random_quote().await,
		}
	}

	pub async fn quotes(&self) -> Vec<Quote> {
		self.context.lock().await.store.quotes().to_vec()
	}

	/// Unique categories in first-seen order
	pub async fn categories(&self) -> Vec<String> {
		self.context.lock().await.store.categories()
	}

	/// How many quotes the current filter shows, e.g. `Showing 3 of 12 quotes`
	pub async fn quote_count(&self) -> String {
		self.context.lock().await.store.count_summary()
	}

	pub async fn pending_changes(&self) -> Vec<PendingChange> {
		self.context.lock().await.queue.pending().to_vec()
	}

	pub async fn status(&self) -> SyncStatus {
		let pending = self.context.lock().await.queue.len();
		self.status_with(pending)
	}

	/// The remote record set seen by the last successful fetch
	pub fn last_server_snapshot(&self) -> Option<Vec<Quote>> {
		lock_state(&self.state).last_server_snapshot.clone()
	}

	/// Drop every pending change without delivering it
	pub async fn reset_pending_changes(&self) -> Result<usize, SyncError> {
		let dropped = self.context.lock().await.queue.reset().await?;
		self.publish_status_with(0).await;
		Ok(dropped)
	}

	fn status_with(&self, pending_count: usize) -> SyncStatus {
		let state = lock_state(&self.state);
		SyncStatus {
			is_syncing: state.is_syncing,
			last_sync_time: state.last_sync_time,
			pending_count,
		}
	}

	async fn publish_status(&self) {
		let status = self.status().await;
		self.emit(SyncEvent::StatusChanged(status)).await;
	}

	async fn publish_status_with(&self, pending_count: usize) {
		let status = self.status_with(pending_count);
		self.emit(SyncEvent::StatusChanged(status)).await;
	}

	/// Remember `quote` as the last viewed one and display it
	async fn display(&self, quote: Quote) {
		match serde_json::to_string(&quote) {
			Ok(content) => {
				if let Err(e) = self.storage.set(LAST_VIEWED_KEY, &content).await {
					warn!("Failed to save last viewed quote: {}", e);
				}
			}
			Err(e) => warn!("Failed to encode last viewed quote: {}", e),
		}
		self.emit(SyncEvent::QuoteDisplayed(quote)).await;
	}

	async fn notify_empty_filter(&self) {
		self.notify("No quotes available in this category", Severity::Info)
			.await;
	}

	async fn notify(&self, message: impl Into<String>, severity: Severity) {
		self.emit(SyncEvent::notification(message, severity)).await;
	}

	async fn emit(&self, event: SyncEvent) {
		self.events.lock().await.dispatch(&event).await;
	}

	/// Surface a failed UI operation as an error notification
	async fn report_failure<T>(&self, result: Result<T, SyncError>) -> Result<T, SyncError> {
		if let Err(e) = &result {
			warn!("Quote operation failed: {}", e);
			self.notify(e.to_string(), Severity::Error).await;
		}
		result
	}
}
