use crate::storage::StorageError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a quote as assigned by whoever created it.
///
/// Remote records carry numeric ids; locally created quotes get a UUID string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuoteId {
	Numeric(u64),
	Text(String),
}

impl QuoteId {
	/// Generate a fresh identity for a locally created quote
	pub fn generate() -> Self {
		QuoteId::Text(uuid::Uuid::new_v4().to_string())
	}

	/// `0` and the empty string do not identify anything
	fn is_blank(&self) -> bool {
		match self {
			QuoteId::Numeric(n) => *n == 0,
			QuoteId::Text(s) => s.is_empty(),
		}
	}
}

impl fmt::Display for QuoteId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			QuoteId::Numeric(n) => write!(f, "{}", n),
			QuoteId::Text(s) => write!(f, "{}", s),
		}
	}
}

/// Key used to match quotes across record sets: the id when present, else the text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QuoteKey {
	Id(QuoteId),
	Text(String),
}

impl fmt::Display for QuoteKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			QuoteKey::Id(id) => write!(f, "#{}", id),
			QuoteKey::Text(text) => write!(f, "\"{}\"", text),
		}
	}
}

/// A single quote record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<QuoteId>,
	pub text: String,
	pub category: String,
	/// Creation time, serialized as epoch millis.
	#[serde(
		default,
		skip_serializing_if = "Option::is_none",
		with = "chrono::serde::ts_milliseconds_option"
	)]
	pub timestamp: Option<DateTime<Utc>>,
}

impl Quote {
	/// Create a quote without identity or timestamp
	pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
		Self {
			id: None,
			text: text.into(),
			category: category.into(),
			timestamp: None,
		}
	}

	pub fn with_id(mut self, id: QuoteId) -> Self {
		self.id = Some(id);
		self
	}

	pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
		self.timestamp = Some(timestamp);
		self
	}

	/// Identity-or-text key of this quote.
	///
	/// Two quotes without ids and with identical text share a key even if their categories differ.
	pub fn key(&self) -> QuoteKey {
		match &self.id {
			Some(id) if !id.is_blank() => QuoteKey::Id(id.clone()),
			_ => QuoteKey::Text(self.text.clone()),
		}
	}

	/// Whether text and category match, ignoring identity and timestamp
	pub fn same_content(&self, other: &Quote) -> bool {
		self.text == other.text && self.category == other.category
	}
}

/// How locally created quotes get their identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityPolicy {
	/// Every new quote receives a generated id
	#[default]
	AssignOnCreate,
	/// New quotes carry no id and are matched by text
	ContentFallback,
}

/// Category filter applied when listing or picking quotes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
	#[default]
	All,
	Category(String),
}

impl CategoryFilter {
	const ALL: &'static str = "all";

	/// Parse the persisted form, where `all` means no filter
	pub fn parse(value: &str) -> Self {
		let value = value.trim();
		if value.is_empty() || value == Self::ALL {
			CategoryFilter::All
		} else {
			CategoryFilter::Category(value.to_string())
		}
	}

	pub fn as_str(&self) -> &str {
		match self {
			CategoryFilter::All => Self::ALL,
			CategoryFilter::Category(category) => category,
		}
	}

	pub fn matches(&self, quote: &Quote) -> bool {
		match self {
			CategoryFilter::All => true,
			CategoryFilter::Category(category) => quote.category == *category,
		}
	}
}

/// Errors raised by quote mutations at the entry point
#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
	#[error("Validation error: {0}")]
	Validation(String),

	#[error("No quote at index {0}")]
	NotFound(usize),

	#[error("Invalid import: {0}")]
	InvalidImport(String),

	#[error(transparent)]
	Storage(#[from] StorageError),
}
