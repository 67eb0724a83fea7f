//! Reserved sync-state module (§4.r)
//!
//! Grounded on the teacher's `StateManager` (load/save/clear over a JSON
//! file per profile), but persisted through the kernel itself rather than
//! directly to the host filesystem: cursors and per-peer state live under
//! the protected `__sync__` module's `cursors/` and `state/` subtrees, so
//! they get the same transactional guarantees as any other node.

use crate::config::SYNC_MODULE_NAME;
use crate::error::SyncError;
use crate::kernel::Kernel;
use crate::sync::vector_clock::VectorClock;
use serde::{Deserialize, Serialize};

fn cursor_path(peer_id: &str) -> String {
	format!("/{}/cursors/{}.json", SYNC_MODULE_NAME, peer_id)
}

fn state_path(peer_id: &str) -> String {
	format!("/{}/state/{}.json", SYNC_MODULE_NAME, peer_id)
}

/// A per-peer sync cursor: the vector clock last acknowledged in each
/// direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncCursor {
	pub sent_clock: VectorClock,
	pub received_clock: VectorClock,
}

/// Ensure the reserved module's subtrees exist (called once on mount).
pub fn ensure_module_tree(kernel: &Kernel, now_ms: u64) -> Result<(), SyncError> {
	kernel.ensure_directory(&format!("/{}/cursors", SYNC_MODULE_NAME), now_ms)?;
	kernel.ensure_directory(&format!("/{}/state", SYNC_MODULE_NAME), now_ms)?;
	Ok(())
}

pub fn load_cursor(kernel: &Kernel, peer_id: &str) -> Result<Option<SyncCursor>, SyncError> {
	let path = cursor_path(peer_id);
	if !kernel.exists(&path)? {
		return Ok(None);
	}
	let bytes = kernel.read(&path)?;
	Ok(Some(serde_json::from_slice(&bytes).map_err(crate::error::boxed_error)?))
}

pub fn save_cursor(
	kernel: &Kernel,
	peer_id: &str,
	cursor: &SyncCursor,
	now_ms: u64,
) -> Result<(), SyncError> {
	let bytes = serde_json::to_vec(cursor).map_err(crate::error::boxed_error)?;
	kernel.write(&cursor_path(peer_id), &bytes, now_ms)?;
	Ok(())
}

/// Arbitrary per-peer state blob (e.g. protocol negotiation results),
/// stored opaquely the way `StateManager::save` stores `PreviousSyncState`.
pub fn save_state(kernel: &Kernel, peer_id: &str, data: &[u8], now_ms: u64) -> Result<(), SyncError> {
	kernel.write(&state_path(peer_id), data, now_ms)?;
	Ok(())
}

pub fn load_state(kernel: &Kernel, peer_id: &str) -> Result<Option<Vec<u8>>, SyncError> {
	let path = state_path(peer_id);
	if !kernel.exists(&path)? {
		return Ok(None);
	}
	Ok(Some(kernel.read(&path)?))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::kernel::MemoryContentStore;
	use crate::storage::memory::MemoryStorage;
	use std::sync::Arc;

	fn new_kernel() -> Kernel {
		Kernel::initialize(Arc::new(MemoryStorage::new()), Arc::new(MemoryContentStore::new())).unwrap()
	}

	#[test]
	fn test_cursor_round_trip() {
		let kernel = new_kernel();
		ensure_module_tree(&kernel, 1).unwrap();
		assert!(load_cursor(&kernel, "peer-a").unwrap().is_none());

		let mut cursor = SyncCursor { sent_clock: VectorClock::new(), received_clock: VectorClock::new() };
		cursor.sent_clock.increment("local");
		save_cursor(&kernel, "peer-a", &cursor, 2).unwrap();

		let loaded = load_cursor(&kernel, "peer-a").unwrap().unwrap();
		assert_eq!(loaded.sent_clock.get("local"), 1);
	}

	#[test]
	fn test_state_round_trip() {
		let kernel = new_kernel();
		ensure_module_tree(&kernel, 1).unwrap();
		assert!(load_state(&kernel, "peer-a").unwrap().is_none());
		save_state(&kernel, "peer-a", b"opaque", 2).unwrap();
		assert_eq!(load_state(&kernel, "peer-a").unwrap(), Some(b"opaque".to_vec()));
	}
}

// vim: ts=4
