//! Durable local key-value storage.
//!
//! The quote manager persists everything it owns (quotes, pending changes, last sync time, the
//! category filter and the last displayed quote) as JSON strings under fixed keys. `KeyValueStore` abstracts where those strings
//! live so the record store and the pending-change queue can be tested against memory and run
//! against the filesystem.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Key holding the JSON array of quotes.
pub const QUOTES_KEY: &str = "quotes";
/// Key holding the JSON array of pending changes.
pub const PENDING_CHANGES_KEY: &str = "pending_changes";
/// Key holding the last successful sync time as epoch millis.
pub const LAST_SYNC_KEY: &str = "last_server_sync";
/// Key holding the selected category filter.
pub const CATEGORY_FILTER_KEY: &str = "category_filter";
/// Key holding the JSON of the last displayed quote.
pub const LAST_VIEWED_KEY: &str = "last_viewed_quote";

/// Errors raised while reading or writing durable storage
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
	#[error("Storage IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Storage serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// String key-value store with write-through semantics
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
	async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
	async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
	async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read a key, treating read failures as an absent value.
///
/// Only for values that are rebuilt on the next write anyway, such as the category filter or the
/// last sync time. Quotes and pending changes must propagate read errors.
pub async fn read_or_absent(storage: &dyn KeyValueStore, key: &str) -> Option<String> {
	match storage.get(key).await {
		Ok(value) => value,
		Err(e) => {
			warn!("Failed to read {} from local storage, treating as absent: {}", key, e);
			None
		}
	}
}

/// File-based implementation of KeyValueStore, one `<key>.json` file per key
pub struct FileKeyValueStore {
	data_dir: PathBuf,
}

impl FileKeyValueStore {
	/// Create a store rooted at `data_dir`, creating the directory if needed.
	pub async fn open(data_dir: PathBuf) -> Result<Self, StorageError> {
		tokio::fs::create_dir_all(&data_dir).await?;
		debug!("Opened local storage at {:?}", data_dir);
		Ok(Self { data_dir })
	}

	fn get_filename(&self, key: &str) -> PathBuf {
		self.data_dir.join(format!("{}.json", key))
	}
}

#[async_trait::async_trait]
impl KeyValueStore for FileKeyValueStore {
	async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
		match tokio::fs::read_to_string(self.get_filename(key)).await {
			Ok(content) => Ok(Some(content)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
		let filename = self.get_filename(key);
		// Readers only ever see a complete value: stage, then rename over the target
		let staging = self.data_dir.join(format!("{}.json.tmp", key));
		tokio::fs::write(&staging, value).await?;
		tokio::fs::rename(&staging, &filename).await?;
		debug!("Wrote {} bytes to {:?}", value.len(), filename);
		Ok(())
	}

	async fn remove(&self, key: &str) -> Result<(), StorageError> {
		match tokio::fs::remove_file(self.get_filename(key)).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}
}

/// In-memory implementation of KeyValueStore.
///
/// Clones share the same map, so a clone handed to a second store instance behaves like the same
/// durable storage seen after a restart.
#[derive(Clone, Default)]
pub struct MemoryKeyValueStore {
	entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
		self.entries
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	/// Whether a value is currently stored under `key`
	pub fn contains(&self, key: &str) -> bool {
		self.entries().contains_key(key)
	}
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryKeyValueStore {
	async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
		Ok(self.entries().get(key).cloned())
	}

	async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
		self.entries().insert(key.to_string(), value.to_string());
		Ok(())
	}

	async fn remove(&self, key: &str) -> Result<(), StorageError> {
		self.entries().remove(key);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_file_store_round_trip_and_remove() {
		let dir = tempfile::tempdir().unwrap();
		let store = FileKeyValueStore::open(dir.path().join("nested"))
			.await
			.unwrap();

		assert_eq!(store.get(QUOTES_KEY).await.unwrap(), None);

		store.set(QUOTES_KEY, "[]").await.unwrap();
		assert_eq!(store.get(QUOTES_KEY).await.unwrap().as_deref(), Some("[]"));
		assert!(dir.path().join("nested").join("quotes.json").exists());

		store.remove(QUOTES_KEY).await.unwrap();
		assert_eq!(store.get(QUOTES_KEY).await.unwrap(), None);
		// Removing twice is not an error
		store.remove(QUOTES_KEY).await.unwrap();
	}

	#[tokio::test]
	async fn test_memory_store_clones_share_entries() {
		let store = MemoryKeyValueStore::new();
		let restarted = store.clone();

		store.set(LAST_SYNC_KEY, "1700000000000").await.unwrap();
		assert!(restarted.contains(LAST_SYNC_KEY));
		assert_eq!(
			restarted.get(LAST_SYNC_KEY).await.unwrap().as_deref(),
			Some("1700000000000")
		);
	}
}
