//! Record store for quotes.
//!
//! `QuoteStore` owns the ordered in-memory quote set and keeps it consistent with durable storage:
//! every mutation is written through before the in-memory set changes, so a failed write leaves
//! both sides at their previous value. It also owns the persisted category filter used when
//! listing or picking quotes.

use crate::quotes::types::{CategoryFilter, IdentityPolicy, Quote, QuoteError, QuoteId};
use crate::storage::{
	CATEGORY_FILTER_KEY, KeyValueStore, QUOTES_KEY, StorageError, read_or_absent,
};

use chrono::Utc;
use rand::seq::IndexedRandom;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Quotes shipped with the application, used when nothing valid is stored
pub fn default_quotes() -> Vec<Quote> {
	[
		("The only way to do great work is to love what you do.", "Motivation"),
		("Life is what happens when you're busy making other plans.", "Life"),
		("The future belongs to those who believe in the beauty of their dreams.", "Dreams"),
		(
			"Success is not final, failure is not fatal: it is the courage to continue that counts.",
			"Success",
		),
		("In the middle of difficulty lies opportunity.", "Opportunity"),
		("The best way to predict the future is to invent it.", "Innovation"),
		("Be the change you wish to see in the world.", "Change"),
		("Everything you've ever wanted is on the other side of fear.", "Courage"),
		("The journey of a thousand miles begins with one step.", "Journey"),
		(
			"What you get by achieving your goals is not as important as what you become by achieving your goals.",
			"Growth",
		),
	]
	.into_iter()
	.map(|(text, category)| Quote::new(text, category))
	.collect()
}

/// In-memory quote set with write-through persistence
pub struct QuoteStore {
	storage: Arc<dyn KeyValueStore>,
	quotes: Vec<Quote>,
	filter: CategoryFilter,
}

impl QuoteStore {
	/// Load quotes and the category filter from storage.
	///
	/// Missing or malformed quote data falls back to the default set. A failed read is returned as
	/// an error so the stored set is never overwritten by defaults. A saved filter naming a
	/// category that no longer exists is reset to `all`.
	pub async fn load(storage: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
		let quotes = match storage.get(QUOTES_KEY).await? {
			Some(content) => match serde_json::from_str::<Vec<Quote>>(&content) {
				Ok(quotes) => {
					debug!("Loaded {} quotes from local storage", quotes.len());
					quotes
				}
				Err(e) => {
					debug!("Stored quotes are malformed, using defaults: {}", e);
					default_quotes()
				}
			},
			None => default_quotes(),
		};

		let filter = read_or_absent(storage.as_ref(), CATEGORY_FILTER_KEY)
			.await
			.map(|value| CategoryFilter::parse(&value))
			.unwrap_or_default();

		let mut store = Self {
			storage,
			quotes,
			filter,
		};
		if let Err(e) = store.revalidate_filter().await {
			warn!("Failed to persist category filter reset: {}", e);
		}
		Ok(store)
	}

	pub fn quotes(&self) -> &[Quote] {
		&self.quotes
	}

	pub fn len(&self) -> usize {
		self.quotes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.quotes.is_empty()
	}

	/// Persist the current quote set
	pub async fn save(&self) -> Result<(), StorageError> {
		write_quotes(self.storage.as_ref(), &self.quotes).await
	}

	/// Swap in a new quote set, persisting it first
	pub async fn replace(&mut self, quotes: Vec<Quote>) -> Result<(), StorageError> {
		write_quotes(self.storage.as_ref(), &quotes).await?;
		self.quotes = quotes;
		Ok(())
	}

	/// Validate and append a new quote
	pub async fn add(
		&mut self,
		text: &str,
		category: &str,
		identity: IdentityPolicy,
	) -> Result<Quote, QuoteError> {
		let (text, category) = validate(text, category)?;

		let mut quote = Quote::new(text, category).with_timestamp(Utc::now());
		if identity == IdentityPolicy::AssignOnCreate {
			quote = quote.with_id(QuoteId::generate());
		}

		let mut quotes = self.quotes.clone();
		quotes.push(quote.clone());
		self.replace(quotes).await?;

		info!("Added quote {} in category {}", quote.key(), quote.category);
		Ok(quote)
	}

	/// Change text and category of the quote at `index`, returning `(old, new)`
	pub async fn edit(
		&mut self,
		index: usize,
		text: &str,
		category: &str,
	) -> Result<(Quote, Quote), QuoteError> {
		let (text, category) = validate(text, category)?;
		let old = self
			.quotes
			.get(index)
			.cloned()
			.ok_or(QuoteError::NotFound(index))?;

		let mut new = old.clone();
		new.text = text;
		new.category = category;

		let mut quotes = self.quotes.clone();
		quotes[index] = new.clone();
		self.replace(quotes).await?;

		info!("Edited quote {} at index {}", new.key(), index);
		Ok((old, new))
	}

	/// Remove the quote at `index`
	pub async fn remove(&mut self, index: usize) -> Result<Quote, QuoteError> {
		if index >= self.quotes.len() {
			return Err(QuoteError::NotFound(index));
		}

		let mut quotes = self.quotes.clone();
		let removed = quotes.remove(index);
		self.replace(quotes).await?;

		info!("Removed quote {} at index {}", removed.key(), index);
		Ok(removed)
	}

	/// Unique categories in first-seen order
	pub fn categories(&self) -> Vec<String> {
		let mut categories: Vec<String> = Vec::new();
		for quote in &self.quotes {
			if !categories.contains(&quote.category) {
				categories.push(quote.category.clone());
			}
		}
		categories
	}

	pub fn filter(&self) -> &CategoryFilter {
		&self.filter
	}

	/// Select and persist a category filter
	pub async fn set_filter(&mut self, filter: CategoryFilter) -> Result<(), StorageError> {
		self.storage
			.set(CATEGORY_FILTER_KEY, filter.as_str())
			.await?;
		self.filter = filter;
		Ok(())
	}

	/// Reset the filter to `all` if its category has disappeared.
	///
	/// Returns whether a reset happened.
	pub async fn revalidate_filter(&mut self) -> Result<bool, StorageError> {
		let stale = match &self.filter {
			CategoryFilter::All => false,
			CategoryFilter::Category(category) => {
				!self.quotes.iter().any(|quote| quote.category == *category)
			}
		};

		if stale {
			info!(
				"Category filter {} no longer matches any quote, resetting to all",
				self.filter.as_str()
			);
			self.set_filter(CategoryFilter::All).await?;
		}
		Ok(stale)
	}

	/// Quotes matching the current filter
	pub fn filtered(&self) -> Vec<&Quote> {
		self.quotes
			.iter()
			.filter(|quote| self.filter.matches(quote))
			.collect()
	}

	/// Human-readable count of the quotes the current filter shows
	pub fn count_summary(&self) -> String {
		let summary = format!("Showing {} of {} quotes", self.filtered().len(), self.len());
		match &self.filter {
			CategoryFilter::All => summary,
			CategoryFilter::Category(category) => format!("{} in \"{}\" category", summary, category),
		}
	}

	/// A uniformly random quote among the filtered ones
	pub fn random_quote(&self) -> Option<&Quote> {
		self.filtered().choose(&mut rand::rng()).copied()
	}

	/// Pretty-printed JSON array of all quotes
	pub fn export_json(&self) -> Result<String, StorageError> {
		Ok(serde_json::to_string_pretty(&self.quotes)?)
	}

	/// Append quotes from a JSON array, skipping entries without text or category.
	///
	/// Returns the number of quotes imported.
	pub async fn import_json(&mut self, json: &str) -> Result<usize, QuoteError> {
		let value: serde_json::Value = serde_json::from_str(json)
			.map_err(|e| QuoteError::InvalidImport(format!("Failed to parse JSON: {}", e)))?;

		let entries = value
			.as_array()
			.ok_or_else(|| QuoteError::InvalidImport("Expected a JSON array of quotes".to_string()))?;

		let imported: Vec<Quote> = entries
			.iter()
			.filter_map(|entry| serde_json::from_value::<Quote>(entry.clone()).ok())
			.filter(|quote| !quote.text.is_empty() && !quote.category.is_empty())
			.collect();

		let count = imported.len();
		if count < entries.len() {
			debug!("Skipped {} invalid entries during import", entries.len() - count);
		}

		let mut quotes = self.quotes.clone();
		quotes.extend(imported);
		self.replace(quotes).await?;

		info!("Imported {} quotes", count);
		Ok(count)
	}
}

async fn write_quotes(storage: &dyn KeyValueStore, quotes: &[Quote]) -> Result<(), StorageError> {
	let content = serde_json::to_string(quotes)?;
	storage.set(QUOTES_KEY, &content).await
}

fn validate(text: &str, category: &str) -> Result<(String, String), QuoteError> {
	let text = text.trim();
	let category = category.trim();
	if text.is_empty() || category.is_empty() {
		return Err(QuoteError::Validation(
			"quote text and category are both required".to_string(),
		));
	}
	Ok((text.to_string(), category.to_string()))
}
