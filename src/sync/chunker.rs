//! Fixed-size content chunking for resumable transfer (§4.m)
//!
//! The teacher's `chunking.rs`/`chunk_tracker.rs` chunk on a rolling hash
//! (`blake3` + `rollsum`) to deduplicate shifted content. §4.m calls for
//! fixed-size chunks keyed by SHA-256 instead, so the boundary logic here is
//! new, but the bookkeeping shape — a `BTreeSet` of missing hashes, a
//! `BTreeMap` of known chunks — is the same one `ChunkTracker` uses.

use crate::error::{ChunkError, SyncError};
use crate::ids;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRef {
	pub index: u32,
	pub hash: String,
	pub size: u32,
}

/// Split `data` into fixed-size chunks of `chunk_size` bytes (the last chunk
/// may be shorter), returning each chunk's descriptor and bytes.
pub fn create_chunks(data: &[u8], chunk_size: usize) -> Result<Vec<(ChunkRef, Vec<u8>)>, SyncError> {
	if chunk_size == 0 {
		return Err(SyncError::Chunk(ChunkError::InvalidConfig {
			message: "chunk_size must be > 0".to_string(),
		}));
	}
	let mut chunks = Vec::with_capacity(data.len().div_ceil(chunk_size));
	for (index, piece) in data.chunks(chunk_size).enumerate() {
		let hash = ids::content_hash(piece);
		chunks.push((ChunkRef { index: index as u32, hash, size: piece.len() as u32 }, piece.to_vec()));
	}
	if chunks.is_empty() {
		chunks.push((ChunkRef { index: 0, hash: ids::content_hash(&[]), size: 0 }, Vec::new()));
	}
	Ok(chunks)
}

/// Reassemble chunks (already in index order) back into the original byte
/// stream, verifying each chunk's hash against its descriptor.
pub fn reassemble_chunks(
	chunks: &[ChunkRef],
	bodies: &BTreeMap<u32, Vec<u8>>,
) -> Result<Vec<u8>, SyncError> {
	let mut out = Vec::new();
	for chunk in chunks {
		let body = bodies.get(&chunk.index).ok_or_else(|| {
			SyncError::Chunk(ChunkError::MissingChunk {
				content_hash: chunk.hash.clone(),
				index: chunk.index,
			})
		})?;
		let actual = ids::content_hash(body);
		if actual != chunk.hash {
			return Err(SyncError::Chunk(ChunkError::HashMismatch {
				expected: chunk.hash.clone(),
				actual,
			}));
		}
		out.extend_from_slice(body);
	}
	Ok(out)
}

/// Given the full set of chunks a transfer needs and the set already held
/// locally, return the ones still missing, in index order.
pub fn missing_chunks(needed: &[ChunkRef], held: &BTreeSet<String>) -> Vec<ChunkRef> {
	let mut missing: Vec<ChunkRef> =
		needed.iter().filter(|c| !held.contains(&c.hash)).cloned().collect();
	missing.sort_by_key(|c| c.index);
	missing
}


// vim: ts=4
