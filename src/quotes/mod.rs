//! Quote records and the local record store.

pub mod store;
pub mod types;

pub use store::{QuoteStore, default_quotes};
pub use types::{CategoryFilter, IdentityPolicy, Quote, QuoteError, QuoteId, QuoteKey};
