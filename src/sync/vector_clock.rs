//! Vector clocks for cross-peer causality tracking (§3.1, §4.n)
//!
//! New relative to the teacher (which tracks causality implicitly through
//! mtimes); the shape — a small ordered map plus a merge/compare pair — is
//! modeled on the `BTreeMap`-based state machines the teacher favors, e.g.
//! `chunk_tracker.rs`'s `BTreeMap<String, TransferStatus>`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeMap;

/// How two vector clocks relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Causality {
	Equal,
	Before,
	After,
	Concurrent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorClock {
	counters: BTreeMap<String, u64>,
}

impl VectorClock {
	pub fn new() -> Self {
		VectorClock::default()
	}

	pub fn get(&self, peer_id: &str) -> u64 {
		*self.counters.get(peer_id).unwrap_or(&0)
	}

	/// Advance `peer_id`'s counter, as happens when that peer originates a
	/// change.
	pub fn increment(&mut self, peer_id: &str) {
		*self.counters.entry(peer_id.to_string()).or_insert(0) += 1;
	}

	/// Pointwise maximum of two clocks, the standard vector-clock merge
	/// applied whenever a remote change is accepted.
	pub fn merge(&self, other: &VectorClock) -> VectorClock {
		let mut merged = self.counters.clone();
		for (peer, &count) in &other.counters {
			let entry = merged.entry(peer.clone()).or_insert(0);
			*entry = (*entry).max(count);
		}
		VectorClock { counters: merged }
	}

	/// Compare causal order. `self` is `Before` `other` if every counter in
	/// `self` is <= the corresponding counter in `other` and at least one is
	/// strictly less; `Concurrent` if neither dominates.
	pub fn compare(&self, other: &VectorClock) -> Causality {
		if self == other {
			return Causality::Equal;
		}
		let mut self_less = false;
		let mut other_less = false;
		let mut peers: std::collections::BTreeSet<&String> = self.counters.keys().collect();
		peers.extend(other.counters.keys());
		for peer in peers {
			let a = self.get(peer);
			let b = other.get(peer);
			match a.cmp(&b) {
				CmpOrdering::Less => self_less = true,
				CmpOrdering::Greater => other_less = true,
				CmpOrdering::Equal => {}
			}
		}
		match (self_less, other_less) {
			(true, false) => Causality::Before,
			(false, true) => Causality::After,
			_ => Causality::Concurrent,
		}
	}

	pub fn is_concurrent_with(&self, other: &VectorClock) -> bool {
		self.compare(other) == Causality::Concurrent
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_increment_and_get() {
		let mut vc = VectorClock::new();
		vc.increment("a");
		vc.increment("a");
		assert_eq!(vc.get("a"), 2);
		assert_eq!(vc.get("b"), 0);
	}

	#[test]
	fn test_merge_takes_pointwise_max() {
		let mut a = VectorClock::new();
		a.increment("a");
		a.increment("a");
		let mut b = VectorClock::new();
		b.increment("a");
		b.increment("b");
		let merged = a.merge(&b);
		assert_eq!(merged.get("a"), 2);
		assert_eq!(merged.get("b"), 1);
	}

	#[test]
	fn test_compare_equal() {
		let a = VectorClock::new();
		let b = VectorClock::new();
		assert_eq!(a.compare(&b), Causality::Equal);
	}

	#[test]
	fn test_compare_before_after() {
		let mut a = VectorClock::new();
		a.increment("x");
		let mut b = a.clone();
		b.increment("x");
		assert_eq!(a.compare(&b), Causality::Before);
		assert_eq!(b.compare(&a), Causality::After);
	}

	#[test]
	fn test_compare_concurrent() {
		let mut a = VectorClock::new();
		a.increment("a");
		let mut b = VectorClock::new();
		b.increment("b");
		assert_eq!(a.compare(&b), Causality::Concurrent);
		assert!(a.is_concurrent_with(&b));
	}
}

// vim: ts=4
