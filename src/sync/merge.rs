//! Remote-wins merge of a local and a remote record set.

use crate::quotes::{Quote, QuoteKey};
use std::collections::{HashMap, HashSet};

/// View a record set by key.
///
/// Each key sits at the position of its first occurrence and holds the value of its last.
pub(crate) fn keyed_view(records: &[Quote]) -> Vec<(QuoteKey, &Quote)> {
	let mut positions: HashMap<QuoteKey, usize> = HashMap::with_capacity(records.len());
	let mut view: Vec<(QuoteKey, &Quote)> = Vec::with_capacity(records.len());

	for record in records {
		let key = record.key();
		match positions.get(&key) {
			Some(&position) => view[position].1 = record,
			None => {
				positions.insert(key.clone(), view.len());
				view.push((key, record));
			}
		}
	}
	view
}

/// Merge `local` into `remote`, letting the remote side win every shared key.
///
/// The result holds every remote record, then each local record whose key the remote set lacks,
/// in local order.
pub fn merge_remote_wins(local: &[Quote], remote: &[Quote]) -> Vec<Quote> {
	let remote_view = keyed_view(remote);
	let remote_keys: HashSet<&QuoteKey> = remote_view.iter().map(|(key, _)| key).collect();

	let mut merged: Vec<Quote> = remote_view
		.iter()
		.map(|(_, record)| (*record).clone())
		.collect();

	merged.extend(
		keyed_view(local)
			.into_iter()
			.filter(|(key, _)| !remote_keys.contains(key))
			.map(|(_, record)| record.clone()),
	);
	merged
}
