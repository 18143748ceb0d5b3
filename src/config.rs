//! Application configuration.
//!
//! Every setting has a default; `AppConfig::from_env` overlays `QUOTE_SYNC_*` environment
//! variables on top. Invalid values are logged and ignored.

use crate::quotes::IdentityPolicy;
use crate::remote::DeliveryStrategy;

use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

const DATA_DIR_VAR: &str = "QUOTE_SYNC_DATA_DIR";
const SNAPSHOT_URL_VAR: &str = "QUOTE_SYNC_SNAPSHOT_URL";
const CHANGES_URL_VAR: &str = "QUOTE_SYNC_CHANGES_URL";
const INTERVAL_VAR: &str = "QUOTE_SYNC_INTERVAL_SECS";
const DELIVERY_VAR: &str = "QUOTE_SYNC_DELIVERY";

/// Remote endpoint configuration
#[derive(Debug, Clone)]
pub struct RemoteConfig {
	/// Endpoint serving the remote record set; the simulated server is used when unset
	pub snapshot_url: Option<String>,
	/// Endpoint accepting pending changes
	pub changes_url: String,
	/// Per-request timeout of the HTTP client
	pub request_timeout: Duration,
}

impl Default for RemoteConfig {
	fn default() -> Self {
		Self {
			snapshot_url: None,
			changes_url: "https://jsonplaceholder.typicode.com/posts".to_string(),
			request_timeout: Duration::from_secs(10),
		}
	}
}

/// Sync cycle configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
	/// Period of the scheduled sync
	pub interval: Duration,
	/// Delay before the first scheduled sync
	pub startup_delay: Duration,
	/// Timeout for a single fetch attempt
	pub fetch_timeout: Duration,
	/// Timeout for a single push attempt
	pub push_timeout: Duration,
	/// Fetch attempts per cycle, including the first
	pub fetch_attempts: u32,
	/// Backoff before the second fetch attempt
	pub retry_initial_interval: Duration,
	pub delivery: DeliveryStrategy,
}

impl Default for SyncConfig {
	fn default() -> Self {
		Self {
			interval: Duration::from_secs(30),
			startup_delay: Duration::from_secs(2),
			fetch_timeout: Duration::from_secs(10),
			push_timeout: Duration::from_secs(10),
			fetch_attempts: 3,
			retry_initial_interval: Duration::from_millis(500),
			delivery: DeliveryStrategy::default(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct AppConfig {
	/// Directory holding the local key-value files
	pub data_dir: PathBuf,
	pub remote: RemoteConfig,
	pub sync: SyncConfig,
	pub identity: IdentityPolicy,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			data_dir: PathBuf::from("data"),
			remote: RemoteConfig::default(),
			sync: SyncConfig::default(),
			identity: IdentityPolicy::default(),
		}
	}
}

impl AppConfig {
	/// Defaults overlaid with `QUOTE_SYNC_*` environment variables
	pub fn from_env() -> Self {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Defaults overlaid with values from `lookup`
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		let mut config = Self::default();

		if let Some(dir) = lookup(DATA_DIR_VAR).filter(|v| !v.trim().is_empty()) {
			config.data_dir = PathBuf::from(dir);
		}
		if let Some(url) = lookup(SNAPSHOT_URL_VAR).filter(|v| !v.trim().is_empty()) {
			config.remote.snapshot_url = Some(url);
		}
		if let Some(url) = lookup(CHANGES_URL_VAR).filter(|v| !v.trim().is_empty()) {
			config.remote.changes_url = url;
		}
		if let Some(value) = lookup(INTERVAL_VAR) {
			match value.trim().parse::<u64>() {
				Ok(secs) if secs > 0 => config.sync.interval = Duration::from_secs(secs),
				_ => warn!("Ignoring invalid {}={:?}", INTERVAL_VAR, value),
			}
		}
		if let Some(value) = lookup(DELIVERY_VAR) {
			match DeliveryStrategy::parse(&value) {
				Some(delivery) => config.sync.delivery = delivery,
				None => warn!("Ignoring invalid {}={:?}", DELIVERY_VAR, value),
			}
		}

		config
	}
}
