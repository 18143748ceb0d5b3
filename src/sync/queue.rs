//! Durable queue of local mutations awaiting delivery.
//!
//! Every change is persisted as soon as it is enqueued and is only dropped once the remote has
//! acknowledged it by id, or when the queue is explicitly reset.

use crate::remote::{PushAck, RemoteError, RemoteGateway};
use crate::storage::{KeyValueStore, PENDING_CHANGES_KEY, StorageError};
use crate::sync::types::{ChangeId, ChangeKind, ChangePayload, PendingChange, SyncError};

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct PendingChangeQueue {
	storage: Arc<dyn KeyValueStore>,
	changes: Vec<PendingChange>,
}

impl PendingChangeQueue {
	/// Load the queue from storage.
	///
	/// Malformed data yields an empty queue. A failed read is returned as an error so queued
	/// changes are never dropped by the next write.
	pub async fn restore(storage: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
		let changes = match storage.get(PENDING_CHANGES_KEY).await? {
			Some(content) => match serde_json::from_str::<Vec<PendingChange>>(&content) {
				Ok(changes) => {
					if !changes.is_empty() {
						info!("Restored {} pending changes", changes.len());
					}
					changes
				}
				Err(e) => {
					warn!("Stored pending changes are malformed, starting empty: {}", e);
					Vec::new()
				}
			},
			None => Vec::new(),
		};

		Ok(Self { storage, changes })
	}

	pub fn pending(&self) -> &[PendingChange] {
		&self.changes
	}

	pub fn len(&self) -> usize {
		self.changes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}

	/// Append a change and persist the whole queue
	pub async fn enqueue(
		&mut self,
		action: ChangeKind,
		payload: ChangePayload,
	) -> Result<ChangeId, StorageError> {
		let change = PendingChange {
			id: ChangeId::generate(),
			action,
			payload,
			timestamp: Utc::now(),
		};
		let id = change.id.clone();

		let mut changes = self.changes.clone();
		changes.push(change);
		self.persist(&changes).await?;
		self.changes = changes;

		debug!("Queued {} change {}", action, id);
		Ok(id)
	}

	/// Drop delivered changes by id, clearing the durable copy once nothing is left
	pub async fn acknowledge(&mut self, ids: &[ChangeId]) -> Result<usize, StorageError> {
		let delivered: HashSet<&ChangeId> = ids.iter().collect();
		let remaining: Vec<PendingChange> = self
			.changes
			.iter()
			.filter(|change| !delivered.contains(&change.id))
			.cloned()
			.collect();
		let removed = self.changes.len() - remaining.len();

		self.persist(&remaining).await?;
		self.changes = remaining;

		if removed > 0 {
			debug!("Acknowledged {} pending changes, {} left", removed, self.changes.len());
		}
		Ok(removed)
	}

	/// Deliver the whole queue in one batch, giving the push at most `timeout`.
	///
	/// Returns `Ok(None)` without pushing when the queue is empty. On failure the queue is left
	/// intact.
	pub async fn flush(
		&mut self,
		gateway: &RemoteGateway,
		timeout: Duration,
	) -> Result<Option<PushAck>, SyncError> {
		let Some(batch) = self.begin_flush() else {
			return Ok(None);
		};
		let ack = batch.push(gateway, timeout).await.map_err(SyncError::Push)?;
		self.complete_flush(&batch).await?;
		Ok(Some(ack))
	}

	/// Snapshot the queue for delivery, or `None` when there is nothing to send.
	///
	/// The snapshot does not borrow the queue, so the push can run while other changes are
	/// enqueued. Only the snapshot's changes are dropped by `complete_flush`.
	pub fn begin_flush(&self) -> Option<FlushBatch> {
		if self.changes.is_empty() {
			return None;
		}
		Some(FlushBatch {
			changes: self.changes.clone(),
		})
	}

	/// Drop the changes of a delivered batch, returning how many were removed
	pub async fn complete_flush(&mut self, batch: &FlushBatch) -> Result<usize, StorageError> {
		let ids: Vec<ChangeId> = batch.changes.iter().map(|change| change.id.clone()).collect();
		self.acknowledge(&ids).await
	}

	/// Drop every pending change, delivered or not
	pub async fn reset(&mut self) -> Result<usize, StorageError> {
		let dropped = self.changes.len();
		self.persist(&[]).await?;
		self.changes.clear();
		info!("Reset pending change queue, dropped {} changes", dropped);
		Ok(dropped)
	}

	async fn persist(&self, changes: &[PendingChange]) -> Result<(), StorageError> {
		if changes.is_empty() {
			return self.storage.remove(PENDING_CHANGES_KEY).await;
		}
		let content = serde_json::to_string(changes)?;
		self.storage.set(PENDING_CHANGES_KEY, &content).await
	}
}

/// Changes taken from the queue for a single push
pub struct FlushBatch {
	changes: Vec<PendingChange>,
}

impl FlushBatch {
	pub fn changes(&self) -> &[PendingChange] {
		&self.changes
	}

	pub fn len(&self) -> usize {
		self.changes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}

	/// Push the batch through `gateway`, failing with `RemoteError::Timeout` after `timeout`
	pub async fn push(
		&self,
		gateway: &RemoteGateway,
		timeout: Duration,
	) -> Result<PushAck, RemoteError> {
		match tokio::time::timeout(timeout, gateway.push_changes(&self.changes)).await {
			Ok(result) => result,
			Err(_) => {
				warn!("Push of {} changes timed out after {:?}", self.changes.len(), timeout);
				Err(RemoteError::Timeout(timeout))
			}
		}
	}
}
