//! Periodic and startup sync triggers.

use crate::sync::orchestrator::SyncOrchestrator;

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};
use tracing::{debug, info};

/// Owns the background task that triggers sync cycles.
///
/// One cycle runs `startup_delay` after start, then one every `interval` measured from start.
/// Triggers that land while a cycle is running are skipped by the orchestrator. The task is
/// aborted on `stop` or drop; an in-flight cycle is not cancelled any other way.
pub struct SyncScheduler {
	handle: Option<JoinHandle<()>>,
}

impl SyncScheduler {
	pub fn start(orchestrator: Arc<SyncOrchestrator>) -> Self {
		let interval = orchestrator.config().interval;
		let startup_delay = orchestrator.config().startup_delay;
		let started = Instant::now();

		info!(
			"Starting sync scheduler: first sync in {:?}, then every {:?}",
			startup_delay, interval
		);

		let handle = tokio::spawn(async move {
			sleep_until(started + startup_delay).await;
			debug!("Running startup sync");
			orchestrator.sync_now().await;

			let mut ticker = interval_at(started + interval, interval);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
			loop {
				ticker.tick().await;
				debug!("Running scheduled sync");
				orchestrator.sync_now().await;
			}
		});

		Self {
			handle: Some(handle),
		}
	}

	pub fn is_running(&self) -> bool {
		self.handle
			.as_ref()
			.is_some_and(|handle| !handle.is_finished())
	}

	pub fn stop(&mut self) {
		if let Some(handle) = self.handle.take() {
			handle.abort();
			info!("Stopped sync scheduler");
		}
	}
}

impl Drop for SyncScheduler {
	fn drop(&mut self) {
		self.stop();
	}
}
