use crate::quotes::{Quote, QuoteError};
use crate::remote::RemoteError;
use crate::storage::StorageError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identity of a pending change
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(String);

impl ChangeId {
	pub fn generate() -> Self {
		ChangeId(uuid::Uuid::new_v4().to_string())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ChangeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Kind of local mutation recorded in the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
	Add,
	Update,
	Delete,
}

impl fmt::Display for ChangeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ChangeKind::Add => write!(f, "add"),
			ChangeKind::Update => write!(f, "update"),
			ChangeKind::Delete => write!(f, "delete"),
		}
	}
}

/// Data carried by a pending change: the record, or both sides of an edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChangePayload {
	Pair { old: Quote, new: Quote },
	Record(Quote),
}

/// A local mutation not yet acknowledged by the remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChange {
	pub id: ChangeId,
	pub action: ChangeKind,
	#[serde(rename = "data")]
	pub payload: ChangePayload,
	#[serde(with = "chrono::serde::ts_milliseconds")]
	pub timestamp: DateTime<Utc>,
}

/// Errors raised inside the sync subsystem
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
	#[error("Fetch failed: {0}")]
	Fetch(RemoteError),

	#[error("Push failed: {0}")]
	Push(RemoteError),

	#[error(transparent)]
	Storage(#[from] StorageError),

	#[error(transparent)]
	Quote(#[from] QuoteError),

	#[error("Event handler error: {0}")]
	Handler(String),
}
