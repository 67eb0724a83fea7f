//! Sync packet / wire schema (§4.l, §6.3)
//!
//! Grounded on the teacher's `protocol/types.rs` (plain serde structs, one
//! `#[serde(rename)]`-tagged enum per wire distinction) and
//! `protocol/messages.rs` (the envelope pattern). A packet carries one or
//! more node changes; each change's body is either inlined as base64 or
//! left as a set of chunk references, decided by `config::SyncConfig`'s
//! `inline_threshold`.

use crate::config::INTERNAL_METADATA_KEYS;
use crate::ids::NodeId;
use crate::sync::chunker::ChunkRef;
use crate::sync::vector_clock::VectorClock;
use base64::engine::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentBody {
	Inline { data_base64: String },
	Chunked { chunks: Vec<ChunkRef>, total_size: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
	Create,
	Update,
	Delete,
	Move,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncChange {
	pub node_id: NodeId,
	pub kind: ChangeKind,
	pub path: String,
	pub from_path: Option<String>,
	pub vector_clock: VectorClock,
	/// The originating node's `modifiedAt` at the time of this change,
	/// consulted by `sync::conflict::decide`'s `newer-wins` policy (§4.n,
	/// §8.5). Carried on the wire since the receiving side has no other way
	/// to learn the sender's local mtime.
	pub mtime: u64,
	/// Never carries an `INTERNAL_METADATA_KEYS` entry; stripped by
	/// `SyncChange::new`.
	pub metadata: BTreeMap<String, String>,
	pub body: Option<ContentBody>,
	/// Always `false`: per design decision, the packet builder never
	/// compresses inline bodies (see SPEC_FULL.md §12.2).
	pub compressed: bool,
}

impl SyncChange {
	#[allow(clippy::too_many_arguments)]
	pub fn new(
		node_id: NodeId,
		kind: ChangeKind,
		path: String,
		from_path: Option<String>,
		vector_clock: VectorClock,
		mtime: u64,
		mut metadata: BTreeMap<String, String>,
		body: Option<ContentBody>,
	) -> Self {
		for key in INTERNAL_METADATA_KEYS {
			metadata.remove(*key);
		}
		SyncChange { node_id, kind, path, from_path, vector_clock, mtime, metadata, body, compressed: false }
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPacket {
	pub peer_id: String,
	pub changes: Vec<SyncChange>,
}

/// Build the body for a file's content given the configured inline
/// threshold: bodies at or below the threshold are base64-inlined, larger
/// bodies are split into fixed-size chunks and referenced (§4.l).
pub fn build_content_body(
	data: &[u8],
	inline_threshold: u64,
	chunk_size: usize,
) -> Result<ContentBody, crate::error::SyncError> {
	if (data.len() as u64) <= inline_threshold {
		Ok(ContentBody::Inline { data_base64: base64::engine::general_purpose::STANDARD.encode(data) })
	} else {
		let chunks = crate::sync::chunker::create_chunks(data, chunk_size)?;
		Ok(ContentBody::Chunked {
			chunks: chunks.into_iter().map(|(r, _)| r).collect(),
			total_size: data.len() as u64,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_small_body_is_inlined() {
		let body = build_content_body(b"small", 5 * 1024 * 1024, 1 << 20).unwrap();
		assert!(matches!(body, ContentBody::Inline { .. }));
	}

	#[test]
	fn test_large_body_is_chunked() {
		let data = vec![0u8; 100];
		let body = build_content_body(&data, 10, 20).unwrap();
		match body {
			ContentBody::Chunked { chunks, total_size } => {
				assert_eq!(total_size, 100);
				assert_eq!(chunks.len(), 5);
			}
			other => panic!("expected Chunked, got {:?}", other),
		}
	}

	#[test]
	fn test_new_change_strips_internal_metadata_keys() {
		let mut metadata = BTreeMap::new();
		metadata.insert("_sync_vc".to_string(), "x".to_string());
		metadata.insert("title".to_string(), "keep me".to_string());
		let change = SyncChange::new(
			NodeId::new_v4(),
			ChangeKind::Update,
			"/a".to_string(),
			None,
			VectorClock::new(),
			1,
			metadata,
			None,
		);
		assert!(!change.metadata.contains_key("_sync_vc"));
		assert_eq!(change.metadata.get("title"), Some(&"keep me".to_string()));
		assert!(!change.compressed);
	}

	#[test]
	fn test_packet_serializes_round_trip() {
		let change = SyncChange::new(
			NodeId::new_v4(),
			ChangeKind::Create,
			"/a".to_string(),
			None,
			VectorClock::new(),
			1,
			BTreeMap::new(),
			Some(ContentBody::Inline { data_base64: "aGk=".to_string() }),
		);
		let packet = SyncPacket { peer_id: "peer-a".to_string(), changes: vec![change] };
		let json = serde_json::to_string(&packet).unwrap();
		let parsed: SyncPacket = serde_json::from_str(&json).unwrap();
		assert_eq!(parsed.peer_id, "peer-a");
		assert_eq!(parsed.changes.len(), 1);
	}
}

// vim: ts=4
