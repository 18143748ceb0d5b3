//! Synchronization and conflict resolution.
//!
//! This module reconciles the local quote set with the remote one and delivers local mutations.
//!
//! - `conflict`: detects records whose content diverged between local and remote.
//! - `merge`: remote-wins merge of the two record sets.
//! - `queue`: durable log of local mutations awaiting delivery.
//! - `events`: event types, handler trait and dispatcher used to report progress to observers.
//! - `orchestrator`: runs non-overlapping sync cycles and the UI-facing quote operations.
//! - `scheduler`: startup and periodic triggers.
//! - `report`: statistics and outcome of a sync cycle.

pub mod conflict;
mod context;
pub mod events;
pub mod merge;
pub mod orchestrator;
pub mod queue;
pub mod report;
pub mod scheduler;
mod state;
pub mod types;

pub use conflict::{Conflict, ConflictKind, detect_conflicts};
pub use events::{
	ChannelEventHandler, EventDispatcher, Severity, SyncEvent, SyncEventHandler, SyncStatus,
	TracingEventHandler,
};
pub use merge::merge_remote_wins;
pub use orchestrator::SyncOrchestrator;
pub use queue::{FlushBatch, PendingChangeQueue};
pub use report::{SyncOutcome, SyncReport};
pub use scheduler::SyncScheduler;
pub use types::{ChangeId, ChangeKind, ChangePayload, PendingChange, SyncError};
