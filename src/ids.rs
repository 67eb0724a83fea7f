//! Identifier and content-hash utilities
//!
//! Grounded on the teacher's `util.rs` hashing helpers (`hash`/`hash_binary`),
//! re-based on SHA-256 (`sha2`) and hex encoding instead of BLAKE3/base64,
//! since §2.c and §4.m require SHA-256 content references. Node IDs use
//! `uuid` v4, the same way the teacher identifies peers and transfers.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Opaque node identifier.
pub type NodeId = Uuid;

/// Generate a fresh node identifier.
pub fn new_node_id() -> NodeId {
	Uuid::new_v4()
}

/// Hash a buffer with SHA-256 and return the lowercase hex digest used as a
/// content reference throughout the kernel and chunk manager.
pub fn content_hash(buf: &[u8]) -> String {
	let digest = Sha256::digest(buf);
	hex::encode(digest)
}

/// Hash a buffer with SHA-256 and return the raw 32-byte digest.
pub fn content_hash_binary(buf: &[u8]) -> [u8; 32] {
	let digest = Sha256::digest(buf);
	let mut out = [0u8; 32];
	out.copy_from_slice(&digest);
	out
}

/// Parse a hex-encoded content hash back into its binary form.
pub fn parse_content_hash(hex_str: &str) -> Result<[u8; 32], String> {
	let bytes = hex::decode(hex_str).map_err(|e| format!("invalid content hash: {}", e))?;
	if bytes.len() != 32 {
		return Err(format!("content hash must be 32 bytes, got {}", bytes.len()));
	}
	let mut out = [0u8; 32];
	out.copy_from_slice(&bytes);
	Ok(out)
}


// vim: ts=4
