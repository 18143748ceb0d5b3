//! Transport seams of the remote gateway.
//!
//! A `RemoteSource` answers "give me the remote record set"; a `PushTransport` accepts a batch of
//! pending changes. The gateway composes one source with a network and an offline transport.

use crate::quotes::Quote;
use crate::remote::types::{PushAck, RemoteError};
use crate::sync::types::PendingChange;

/// Source of the remote record set
#[async_trait::async_trait]
pub trait RemoteSource: Send + Sync {
	/// Fetch the full remote record set in one round trip
	async fn fetch_snapshot(&self) -> Result<Vec<Quote>, RemoteError>;

	/// Get the name of this source for logging
	fn name(&self) -> &'static str;
}

/// Destination for batches of pending changes
#[async_trait::async_trait]
pub trait PushTransport: Send + Sync {
	/// Deliver a batch of pending changes
	async fn push(&self, changes: &[PendingChange]) -> Result<PushAck, RemoteError>;

	/// Get the name of this transport for logging
	fn name(&self) -> &'static str;
}
