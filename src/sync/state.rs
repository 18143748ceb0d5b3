use crate::quotes::Quote;
use crate::storage::{KeyValueStore, LAST_SYNC_KEY, read_or_absent};

use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Sync bookkeeping owned by the orchestrator
#[derive(Debug, Default)]
pub(crate) struct SyncState {
	pub is_syncing: bool,
	pub last_sync_time: Option<DateTime<Utc>>,
	pub last_server_snapshot: Option<Vec<Quote>>,
}

impl SyncState {
	/// Idle state carrying the persisted last sync time, if any
	pub async fn restore(storage: &dyn KeyValueStore) -> Self {
		let last_sync_time = read_or_absent(storage, LAST_SYNC_KEY)
			.await
			.and_then(|value| match value.trim().parse::<i64>() {
				Ok(millis) => DateTime::from_timestamp_millis(millis),
				Err(e) => {
					warn!("Ignoring malformed last sync time {:?}: {}", value, e);
					None
				}
			});

		if let Some(time) = last_sync_time {
			debug!("Last successful sync at {}", time);
		}

		Self {
			last_sync_time,
			..Self::default()
		}
	}
}

pub(crate) fn lock_state(state: &Mutex<SyncState>) -> MutexGuard<'_, SyncState> {
	state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Holds the `is_syncing` flag for the lifetime of one cycle
pub(crate) struct CycleGuard<'a> {
	state: &'a Mutex<SyncState>,
}

impl<'a> CycleGuard<'a> {
	/// Set `is_syncing`, or return `None` if a cycle is already running
	pub fn try_begin(state: &'a Mutex<SyncState>) -> Option<Self> {
		let mut guard = lock_state(state);
		if guard.is_syncing {
			return None;
		}
		guard.is_syncing = true;
		Some(Self { state })
	}
}

impl Drop for CycleGuard<'_> {
	fn drop(&mut self) {
		lock_state(self.state).is_syncing = false;
	}
}
