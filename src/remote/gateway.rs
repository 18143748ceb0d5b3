//! Remote gateway: fetch the remote record set and push pending changes.
//!
//! The gateway pairs one `RemoteSource` with a network and an offline `PushTransport`; the
//! `DeliveryStrategy` decides which transport a push goes through. Fetches are a single round
//! trip and are never retried here.

use crate::quotes::Quote;
use crate::remote::transport::{PushTransport, RemoteSource};
use crate::remote::types::{DeliveryStrategy, PushAck, RemoteError};
use crate::sync::types::PendingChange;

use tracing::{debug, warn};

pub struct RemoteGateway {
	source: Box<dyn RemoteSource>,
	network: Box<dyn PushTransport>,
	offline: Box<dyn PushTransport>,
	strategy: DeliveryStrategy,
}

impl RemoteGateway {
	pub fn new(
		source: Box<dyn RemoteSource>,
		network: Box<dyn PushTransport>,
		offline: Box<dyn PushTransport>,
		strategy: DeliveryStrategy,
	) -> Self {
		Self {
			source,
			network,
			offline,
			strategy,
		}
	}

	pub fn strategy(&self) -> DeliveryStrategy {
		self.strategy
	}

	/// Fetch the remote record set
	pub async fn fetch_remote(&self) -> Result<Vec<Quote>, RemoteError> {
		debug!("Fetching remote record set via {}", self.source.name());
		self.source.fetch_snapshot().await
	}

	/// Push a batch of pending changes according to the delivery strategy
	pub async fn push_changes(&self, changes: &[PendingChange]) -> Result<PushAck, RemoteError> {
		match self.strategy {
			DeliveryStrategy::Strict => self.network.push(changes).await,
			DeliveryStrategy::Offline => self.offline.push(changes).await,
			DeliveryStrategy::BestEffort => match self.network.push(changes).await {
				Ok(ack) => Ok(ack),
				Err(e) => {
					warn!(
						"{} push failed, degrading to {}: {}",
						self.network.name(),
						self.offline.name(),
						e
					);
					self.offline.push(changes).await
				}
			},
		}
	}
}
