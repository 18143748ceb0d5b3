//! HTTP client for the remote quote endpoint.
//!
//! Fetches the remote record set with `GET` and delivers pending changes with `POST`, both as JSON.

use crate::config::RemoteConfig;
use crate::quotes::Quote;
use crate::remote::transport::{PushTransport, RemoteSource};
use crate::remote::types::{Delivery, PushAck, RemoteError};
use crate::sync::types::PendingChange;

use reqwest::Client;
use tracing::{debug, info};

/// HTTP implementation of both remote seams
#[derive(Clone)]
pub struct HttpRemote {
	/// The underlying HTTP client.
	http_client: Client,
	/// Endpoint returning the remote record set; `None` when the remote only accepts changes.
	snapshot_url: Option<String>,
	/// Endpoint accepting batches of pending changes.
	changes_url: String,
}

impl HttpRemote {
	/// Create a new client from remote configuration.
	///
	/// # Errors
	/// Returns `RemoteError::Http` if the HTTP client cannot be built.
	pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
		let http_client = Client::builder().timeout(config.request_timeout).build()?;

		Ok(Self {
			http_client,
			snapshot_url: config.snapshot_url.clone(),
			changes_url: config.changes_url.clone(),
		})
	}
}

#[async_trait::async_trait]
impl RemoteSource for HttpRemote {
	async fn fetch_snapshot(&self) -> Result<Vec<Quote>, RemoteError> {
		let url = self.snapshot_url.as_deref().ok_or_else(|| {
			RemoteError::Unavailable("no snapshot endpoint configured".to_string())
		})?;

		debug!("Fetching remote quotes from {}", url);
		let response = self
			.http_client
			.get(url)
			.header("Accept", "application/json")
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(RemoteError::Status(response.status().as_u16()));
		}

		let body = response.text().await?;
		let quotes: Vec<Quote> = serde_json::from_str(&body)?;
		info!("Fetched {} quotes from {}", quotes.len(), url);
		Ok(quotes)
	}

	fn name(&self) -> &'static str {
		"HttpRemote"
	}
}

#[async_trait::async_trait]
impl PushTransport for HttpRemote {
	async fn push(&self, changes: &[PendingChange]) -> Result<PushAck, RemoteError> {
		debug!("Posting {} changes to {}", changes.len(), self.changes_url);

		let response = self
			.http_client
			.post(&self.changes_url)
			.header("Content-Type", "application/json")
			.header("Accept", "application/json")
			.json(changes)
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(RemoteError::Status(response.status().as_u16()));
		}

		let body: serde_json::Value = response.json().await?;
		debug!("Remote acknowledged changes: {}", body);

		Ok(PushAck {
			delivery: Delivery::Remote,
			received: changes.len(),
			message: "Changes accepted by server".to_string(),
		})
	}

	fn name(&self) -> &'static str {
		"HttpRemote"
	}
}
