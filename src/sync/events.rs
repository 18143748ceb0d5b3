//! Event system for quote synchronization.
//!
//! The orchestrator reports everything a UI needs through `SyncEvent`s: user-facing
//! notifications, the quote to display, sync status changes, and resolved conflicts. Observers
//! implement `SyncEventHandler` and are registered with the orchestrator's `EventDispatcher`, which
//! keeps the sync logic independent of how (or whether) results are rendered.

use crate::quotes::Quote;
use crate::sync::conflict::Conflict;
use crate::sync::types::SyncError;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
	Info,
	Success,
	Warning,
	Error,
}

/// Snapshot of the sync state shown to observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
	pub is_syncing: bool,
	pub last_sync_time: Option<DateTime<Utc>>,
	pub pending_count: usize,
}

/// Events emitted by the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
	/// A message for the user
	Notification { message: String, severity: Severity },
	/// A quote should be displayed
	QuoteDisplayed(Quote),
	/// Sync state changed
	StatusChanged(SyncStatus),
	/// Conflicting records were resolved in favor of the remote
	ConflictsResolved(Vec<Conflict>),
}

impl SyncEvent {
	pub fn notification(message: impl Into<String>, severity: Severity) -> Self {
		SyncEvent::Notification {
			message: message.into(),
			severity,
		}
	}
}

/// Trait for handling sync events.
///
/// Implementors receive all sync events and can perform side effects or state updates.
#[async_trait::async_trait]
pub trait SyncEventHandler: Send + Sync {
	/// Handle a sync event.
	async fn handle(&mut self, event: &SyncEvent) -> Result<(), SyncError>;

	/// Get the name of this handler for logging and diagnostics.
	fn name(&self) -> &'static str;
}

/// Event dispatcher that manages multiple event handlers.
///
/// Handlers are called in registration order; one failing handler does not stop the others.
#[derive(Default)]
pub struct EventDispatcher {
	handlers: Vec<Box<dyn SyncEventHandler>>,
}

impl EventDispatcher {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register_handler(&mut self, handler: Box<dyn SyncEventHandler>) {
		debug!("Registered event handler {}", handler.name());
		self.handlers.push(handler);
	}

	/// Dispatch an event to all registered handlers.
	///
	/// Errors from handlers are logged, but do not stop other handlers from running.
	pub async fn dispatch(&mut self, event: &SyncEvent) {
		for handler in &mut self.handlers {
			if let Err(e) = handler.handle(event).await {
				error!("Handler {} failed to process event: {}", handler.name(), e);
			}
		}
	}
}

/// Writes every event to the tracing log
pub struct TracingEventHandler;

#[async_trait::async_trait]
impl SyncEventHandler for TracingEventHandler {
	async fn handle(&mut self, event: &SyncEvent) -> Result<(), SyncError> {
		match event {
			SyncEvent::Notification { message, severity } => match severity {
				Severity::Info | Severity::Success => info!("{}", message),
				Severity::Warning => warn!("{}", message),
				Severity::Error => error!("{}", message),
			},
			SyncEvent::QuoteDisplayed(quote) => {
				info!("\"{}\" ({})", quote.text, quote.category);
			}
			SyncEvent::StatusChanged(status) => {
				debug!(
					"Sync status: syncing={}, last sync={:?}, pending={}",
					status.is_syncing, status.last_sync_time, status.pending_count
				);
			}
			SyncEvent::ConflictsResolved(conflicts) => {
				for conflict in conflicts {
					debug!(
						"Resolved {} in favor of server: {:?} -> {:?}",
						conflict.key, conflict.local.category, conflict.remote.category
					);
				}
			}
		}
		Ok(())
	}

	fn name(&self) -> &'static str {
		"TracingEventHandler"
	}
}

/// Forwards events to a tokio channel
pub struct ChannelEventHandler {
	sender: mpsc::UnboundedSender<SyncEvent>,
}

impl ChannelEventHandler {
	/// Create a handler together with the receiving end of its channel
	pub fn new() -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
		let (sender, receiver) = mpsc::unbounded_channel();
		(Self { sender }, receiver)
	}

	pub fn from_sender(sender: mpsc::UnboundedSender<SyncEvent>) -> Self {
		Self { sender }
	}
}

#[async_trait::async_trait]
impl SyncEventHandler for ChannelEventHandler {
	async fn handle(&mut self, event: &SyncEvent) -> Result<(), SyncError> {
		self.sender
			.send(event.clone())
			.map_err(|_| SyncError::Handler("event receiver dropped".to_string()))
	}

	fn name(&self) -> &'static str {
		"ChannelEventHandler"
	}
}
