//! Conflict detection and resolution (§4.n)
//!
//! Grounded on the teacher's `conflict::resolver::ConflictResolver`
//! (a small struct wrapping a default strategy, `resolve()` matching on a
//! strategy enum) generalized from version-index selection to the
//! vector-clock apply/skip/conflict decision §4.n describes, plus the
//! per-node `quarantined` flag recorded in SPEC_FULL.md §12.1.

use crate::ids::NodeId;
use crate::sync::vector_clock::{Causality, VectorClock};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
	ServerWins,
	ClientWins,
	NewerWins,
	Manual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
	/// Remote change is causally newer (or the policy picks it); apply it.
	Apply,
	/// Local change already dominates; ignore the remote change.
	Skip,
	/// Concurrent changes under a policy that can't auto-resolve; persist a
	/// conflict record.
	Conflict,
}

#[derive(Debug, Clone)]
pub struct ConflictRecord {
	pub node_id: NodeId,
	pub local_clock: VectorClock,
	pub remote_clock: VectorClock,
	/// Set once a `manual` conflict is recorded; cleared by
	/// `resolve_conflict`. While set, further remote changes for this node
	/// are parked rather than re-running detection (SPEC_FULL.md §12.1).
	pub quarantined: bool,
}

/// Decide how to apply a remote change given the local and remote mtimes
/// (only consulted for `NewerWins`), following the `ConflictResolution`
/// match-on-strategy shape of the teacher's `ConflictResolver::resolve`.
pub fn decide(
	local_clock: &VectorClock,
	remote_clock: &VectorClock,
	local_mtime: u64,
	remote_mtime: u64,
	policy: ConflictPolicy,
) -> Decision {
	match local_clock.compare(remote_clock) {
		Causality::Equal => Decision::Skip,
		Causality::Before => Decision::Apply,
		Causality::After => Decision::Skip,
		Causality::Concurrent => match policy {
			ConflictPolicy::ServerWins => Decision::Apply,
			ConflictPolicy::ClientWins => Decision::Skip,
			ConflictPolicy::NewerWins => {
				if remote_mtime >= local_mtime {
					Decision::Apply
				} else {
					Decision::Skip
				}
			}
			ConflictPolicy::Manual => Decision::Conflict,
		},
	}
}

impl ConflictRecord {
	pub fn new(node_id: NodeId, local_clock: VectorClock, remote_clock: VectorClock) -> Self {
		ConflictRecord { node_id, local_clock, remote_clock, quarantined: true }
	}

	/// Resolve the conflict, returning which side wins and lifting the
	/// quarantine.
	pub fn resolve(&mut self, keep_local: bool) -> VectorClock {
		self.quarantined = false;
		if keep_local {
			self.local_clock.clone()
		} else {
			self.remote_clock.clone()
		}
	}
}


// vim: ts=4
