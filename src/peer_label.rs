//! Peer display label
//!
//! Grounded on `node_labels.rs`'s `truncate_smart` (preserve start and end,
//! elide the middle), generalized from multi-node address differentiation to
//! formatting a single `peerId` for log lines and `sync status` output.

/// Shorten `peer_id` to at most `max_len` characters, eliding the middle so
/// both a recognizable prefix and suffix survive (useful for UUID-shaped
/// peer ids, where the tail often carries the distinguishing bits).
pub fn format_peer_label(peer_id: &str, max_len: usize) -> String {
	if peer_id.chars().count() <= max_len {
		return peer_id.to_string();
	}
	if max_len <= 3 {
		return peer_id.chars().take(max_len).collect();
	}
	let ellipsis = '…';
	let available = max_len.saturating_sub(1);
	let start_len = available.div_ceil(2);
	let end_len = available / 2;
	let start: String = peer_id.chars().take(start_len).collect();
	let end: String = peer_id.chars().rev().take(end_len).collect::<String>().chars().rev().collect();
	format!("{start}{ellipsis}{end}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_short_peer_id_unchanged() {
		assert_eq!(format_peer_label("local", 12), "local");
	}

	#[test]
	fn test_long_peer_id_elided() {
		let label = format_peer_label("9f86d081884c7d659a2feaa0c55ad015a3bf4f1b", 12);
		assert_eq!(label.chars().count(), 12);
		assert!(label.starts_with("9f86"));
		assert!(label.contains('…'));
	}
}

// vim: ts=4
