//! Outcome reporting for sync cycles.

use crate::remote::Delivery;
use crate::sync::types::SyncError;

use chrono::{DateTime, Utc};

/// Statistics of one completed sync cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
	/// Records in the fetched remote set
	pub fetched: usize,
	/// Conflicts resolved in favor of the remote
	pub conflicts: usize,
	/// Records in the store after the merge
	pub merged_total: usize,
	/// Pending changes acknowledged during this cycle
	pub pushed: usize,
	/// Guarantee obtained for the pushed changes, if anything was pushed
	pub delivery: Option<Delivery>,
	/// Why the push failed, if it did
	pub push_error: Option<String>,
	pub completed_at: DateTime<Utc>,
}

impl SyncReport {
	pub fn summary(&self) -> String {
		let push = match (&self.push_error, self.delivery) {
			(Some(e), _) => format!("push failed ({})", e),
			(None, Some(Delivery::Remote)) => format!("{} changes pushed", self.pushed),
			(None, Some(Delivery::LocalSimulation)) => {
				format!("{} changes acknowledged locally", self.pushed)
			}
			(None, None) => "nothing to push".to_string(),
		};
		format!(
			"{} fetched, {} conflicts, {} quotes after merge, {}",
			self.fetched, self.conflicts, self.merged_total, push
		)
	}
}

/// Result of a sync trigger
#[derive(Debug)]
pub enum SyncOutcome {
	/// Another cycle was already running
	Skipped,
	Completed(SyncReport),
	/// The cycle aborted; state from before the cycle is kept
	Failed(SyncError),
}

impl SyncOutcome {
	pub fn report(&self) -> Option<&SyncReport> {
		match self {
			SyncOutcome::Completed(report) => Some(report),
			_ => None,
		}
	}

	pub fn is_skipped(&self) -> bool {
		matches!(self, SyncOutcome::Skipped)
	}
}
