use crate::quotes::{Quote, QuoteStore};
use crate::storage::{KeyValueStore, StorageError};
use crate::sync::queue::PendingChangeQueue;
use crate::sync::types::{ChangeKind, ChangePayload, SyncError};

use std::sync::Arc;
use tracing::error;

/// Local quote state guarded as one unit: the record store and its pending changes
pub(crate) struct QuoteContext {
	pub store: QuoteStore,
	pub queue: PendingChangeQueue,
}

impl QuoteContext {
	pub async fn restore(storage: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
		Ok(Self {
			store: QuoteStore::load(storage.clone()).await?,
			queue: PendingChangeQueue::restore(storage).await?,
		})
	}

	/// Queue the change for a store mutation that has already been applied.
	///
	/// If the change cannot be queued the store is put back to `before`, so a mutation is never
	/// kept without its pending change.
	pub async fn record(
		&mut self,
		before: Vec<Quote>,
		action: ChangeKind,
		payload: ChangePayload,
	) -> Result<(), SyncError> {
		if let Err(e) = self.queue.enqueue(action, payload).await {
			if let Err(rollback) = self.store.replace(before).await {
				error!("Failed to roll back {} after queue failure: {}", action, rollback);
			}
			return Err(e.into());
		}
		Ok(())
	}
}
