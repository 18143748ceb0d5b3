//! In-process stand-ins for the remote endpoint.
//!
//! `SimulatedServer` serves a seeded record set with network-like latency and occasionally
//! publishes a new quote. `OfflineTransport` acknowledges pushes locally when no network delivery
//! is possible.

use crate::quotes::{Quote, QuoteId};
use crate::remote::transport::{PushTransport, RemoteSource};
use crate::remote::types::{Delivery, PushAck, RemoteError};
use crate::sync::types::PendingChange;

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::debug;

const SERVER_CATEGORY: &str = "Server";

/// Sleep for a uniformly random duration within `latency`
async fn simulated_delay(latency: &RangeInclusive<Duration>) {
	let min = latency.start().as_millis() as u64;
	let max = latency.end().as_millis() as u64;
	if max == 0 {
		return;
	}
	let millis = rand::rng().random_range(min.min(max)..=max);
	tokio::time::sleep(Duration::from_millis(millis)).await;
}

/// Simulated remote with a seeded record set
pub struct SimulatedServer {
	quotes: Vec<Quote>,
	latency: RangeInclusive<Duration>,
	update_probability: f64,
}

impl SimulatedServer {
	/// Server seeded with twelve quotes, ids 1 to 12
	pub fn new() -> Self {
		let now = Utc::now();
		let quotes = [
			("The only way to do great work is to love what you do.", "Motivation", 3_600_000),
			("Life is what happens when you're busy making other plans.", "Life", 1_800_000),
			("The future belongs to those who believe in the beauty of their dreams.", "Dreams", 900_000),
			(
				"Success is not final, failure is not fatal: it is the courage to continue that counts.",
				"Success",
				450_000,
			),
			("In the middle of difficulty lies opportunity.", "Opportunity", 225_000),
			("The best way to predict the future is to invent it.", "Innovation", 112_500),
			("Be the change you wish to see in the world.", "Change", 56_250),
			("Everything you've ever wanted is on the other side of fear.", "Courage", 28_125),
			("The journey of a thousand miles begins with one step.", "Journey", 14_062),
			(
				"What you get by achieving your goals is not as important as what you become by achieving your goals.",
				"Growth",
				7_031,
			),
			(
				"The greatest glory in living lies not in never falling, but in rising every time we fall.",
				"Resilience",
				0,
			),
			("The way to get started is to quit talking and begin doing.", "Action", 0),
		]
		.into_iter()
		.zip(1u64..)
		.map(|((text, category, age_ms), id)| {
			Quote::new(text, category)
				.with_id(QuoteId::Numeric(id))
				.with_timestamp(now - ChronoDuration::milliseconds(age_ms))
		})
		.collect();

		Self::with_quotes(quotes)
	}

	/// Server serving exactly `quotes`
	pub fn with_quotes(quotes: Vec<Quote>) -> Self {
		Self {
			quotes,
			latency: Duration::from_millis(500)..=Duration::from_millis(1500),
			update_probability: 0.3,
		}
	}

	pub fn with_latency(mut self, latency: RangeInclusive<Duration>) -> Self {
		self.latency = latency;
		self
	}

	/// Chance that a fetch includes a freshly published quote
	pub fn with_update_probability(mut self, probability: f64) -> Self {
		self.update_probability = if probability.is_nan() {
			0.0
		} else {
			probability.clamp(0.0, 1.0)
		};
		self
	}
}

impl Default for SimulatedServer {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait::async_trait]
impl RemoteSource for SimulatedServer {
	async fn fetch_snapshot(&self) -> Result<Vec<Quote>, RemoteError> {
		simulated_delay(&self.latency).await;

		let mut quotes = self.quotes.clone();
		if rand::rng().random_bool(self.update_probability) {
			let now = Utc::now();
			let published = Quote::new(
				format!("New quote from server: {}", now.format("%H:%M:%S")),
				SERVER_CATEGORY,
			)
			.with_id(QuoteId::Numeric(now.timestamp_millis().unsigned_abs()))
			.with_timestamp(now);
			debug!("Simulated server published {}", published.key());
			quotes.push(published);
		}
		Ok(quotes)
	}

	fn name(&self) -> &'static str {
		"SimulatedServer"
	}
}

/// Local acknowledgment of pushed changes
pub struct OfflineTransport {
	latency: RangeInclusive<Duration>,
}

impl OfflineTransport {
	pub fn new() -> Self {
		Self {
			latency: Duration::from_millis(300)..=Duration::from_millis(800),
		}
	}

	pub fn with_latency(mut self, latency: RangeInclusive<Duration>) -> Self {
		self.latency = latency;
		self
	}
}

impl Default for OfflineTransport {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait::async_trait]
impl PushTransport for OfflineTransport {
	async fn push(&self, changes: &[PendingChange]) -> Result<PushAck, RemoteError> {
		simulated_delay(&self.latency).await;

		Ok(PushAck {
			delivery: Delivery::LocalSimulation,
			received: changes.len(),
			message: "Data synced successfully (simulated)".to_string(),
		})
	}

	fn name(&self) -> &'static str {
		"OfflineTransport"
	}
}
