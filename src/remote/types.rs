use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How pending changes are delivered to the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryStrategy {
	/// Network transport only; failures are returned
	Strict,
	/// Network first, local simulation when the network fails
	#[default]
	BestEffort,
	/// Local simulation only
	Offline,
}

impl DeliveryStrategy {
	pub fn parse(value: &str) -> Option<Self> {
		match value.trim().to_ascii_lowercase().as_str() {
			"strict" => Some(DeliveryStrategy::Strict),
			"best-effort" | "besteffort" | "best_effort" => Some(DeliveryStrategy::BestEffort),
			"offline" => Some(DeliveryStrategy::Offline),
			_ => None,
		}
	}
}

/// Which guarantee a push acknowledgment carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
	/// The remote endpoint accepted the batch
	Remote,
	/// Acknowledged locally without reaching the remote
	LocalSimulation,
}

/// Acknowledgment of a pushed batch of pending changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushAck {
	pub delivery: Delivery,
	/// Number of changes acknowledged
	pub received: usize,
	pub message: String,
}

impl PushAck {
	pub fn is_degraded(&self) -> bool {
		self.delivery == Delivery::LocalSimulation
	}
}

/// Errors talking to the remote endpoint
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("Remote returned status {0}")]
	Status(u16),

	#[error("Remote did not answer within {0:?}")]
	Timeout(Duration),

	#[error("Remote unavailable: {0}")]
	Unavailable(String),

	#[error("JSON parse error: {0}")]
	Json(#[from] serde_json::Error),
}
