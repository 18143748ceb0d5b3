//! Divergence detection between a local and a remote record set.

use crate::quotes::{Quote, QuoteKey};
use crate::sync::merge::keyed_view;
use std::collections::HashMap;

/// What diverged between the two sides of a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
	/// Text or category differ
	Content,
}

/// A record present on both sides with different content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
	pub key: QuoteKey,
	pub local: Quote,
	pub remote: Quote,
	pub kind: ConflictKind,
}

/// Flag every key present in both sets whose text or category differ.
///
/// Keys present on one side only are not conflicts. Results follow the local keyed order.
pub fn detect_conflicts(local: &[Quote], remote: &[Quote]) -> Vec<Conflict> {
	let remote_by_key: HashMap<QuoteKey, &Quote> = keyed_view(remote).into_iter().collect();

	keyed_view(local)
		.into_iter()
		.filter_map(|(key, local)| {
			let remote = remote_by_key.get(&key)?;
			if local.same_content(remote) {
				return None;
			}
			Some(Conflict {
				key,
				local: local.clone(),
				remote: (*remote).clone(),
				kind: ConflictKind::Content,
			})
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::quotes::QuoteId;
	use chrono::DateTime;

	fn quote(id: u64, text: &str, category: &str) -> Quote {
		Quote::new(text, category).with_id(QuoteId::Numeric(id))
	}

	#[test]
	fn test_category_change_is_a_conflict() {
		let local = vec![quote(1, "A", "X")];
		let remote = vec![quote(1, "A", "Y"), quote(2, "B", "Z")];

		let conflicts = detect_conflicts(&local, &remote);
		assert_eq!(conflicts.len(), 1);
		assert_eq!(conflicts[0].key, QuoteKey::Id(QuoteId::Numeric(1)));
		assert_eq!(conflicts[0].local.category, "X");
		assert_eq!(conflicts[0].remote.category, "Y");
		assert_eq!(conflicts[0].kind, ConflictKind::Content);
	}

	#[test]
	fn test_one_sided_keys_and_timestamps_are_ignored() {
		let stamped = quote(1, "A", "X")
			.with_timestamp(DateTime::from_timestamp_millis(1_000).unwrap_or_default());
		let local = vec![stamped, quote(5, "Only here", "L")];
		let remote = vec![quote(1, "A", "X"), quote(6, "Only there", "R")];

		assert!(detect_conflicts(&local, &remote).is_empty());
		assert!(detect_conflicts(&[], &remote).is_empty());
		assert!(detect_conflicts(&local, &[]).is_empty());
	}

	#[test]
	fn test_order_follows_local_keyed_view() {
		let local = vec![quote(2, "B", "X"), quote(1, "A", "X")];
		let remote = vec![quote(1, "A2", "X"), quote(2, "B2", "X")];

		let keys: Vec<QuoteKey> = detect_conflicts(&local, &remote)
			.into_iter()
			.map(|conflict| conflict.key)
			.collect();
		assert_eq!(
			keys,
			vec![
				QuoteKey::Id(QuoteId::Numeric(2)),
				QuoteKey::Id(QuoteId::Numeric(1)),
			]
		);
	}
}
