//! Blob store keyed by opaque `contentRef`
//!
//! Grounded directly on the teacher's `cache.rs`: a single `redb::Database`
//! with one `TableDefinition`, opened/created on construction, with a
//! begin_write/commit pair per mutation. Keys here are the kernel's opaque
//! `VNode::content_ref` strings (stable across rewrites, distinct from the
//! SHA-256 `ids::content_hash` the sync wire protocol computes separately)
//! rather than relative file paths, and values are raw file bytes rather
//! than a serialized `CacheEntry`.

use crate::error::SyncError;
use crate::kernel::ContentStore;
use redb::{ReadableDatabase, TableDefinition};
use std::path::Path;

const BLOBS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("blobs");

pub struct BlobStore {
	db: redb::Database,
}

impl BlobStore {
	/// Open or create a blob store database at `db_path`.
	pub fn open(db_path: &Path) -> Result<Self, SyncError> {
		let db = redb::Database::create(db_path).map_err(crate::error::boxed_error)?;
		{
			let write_txn = db.begin_write().map_err(crate::error::boxed_error)?;
			let _ = write_txn.open_table(BLOBS_TABLE).map_err(crate::error::boxed_error)?;
			write_txn.commit().map_err(crate::error::boxed_error)?;
		}
		Ok(BlobStore { db })
	}

	/// Store a blob under its content ref. Idempotent: re-storing the same
	/// ref with the same bytes is a no-op in effect; storing different
	/// bytes under an existing ref overwrites the prior payload.
	pub fn put(&self, content_ref: &str, data: &[u8]) -> Result<(), SyncError> {
		let write_txn = self.db.begin_write().map_err(crate::error::boxed_error)?;
		{
			let mut table = write_txn.open_table(BLOBS_TABLE).map_err(crate::error::boxed_error)?;
			table.insert(content_ref, data).map_err(crate::error::boxed_error)?;
		}
		write_txn.commit().map_err(crate::error::boxed_error)?;
		Ok(())
	}

	pub fn get(&self, content_ref: &str) -> Result<Option<Vec<u8>>, SyncError> {
		let read_txn = self.db.begin_read().map_err(crate::error::boxed_error)?;
		let table = read_txn.open_table(BLOBS_TABLE).map_err(crate::error::boxed_error)?;
		match table.get(content_ref).map_err(crate::error::boxed_error)? {
			Some(value) => Ok(Some(value.value().to_vec())),
			None => Ok(None),
		}
	}

	pub fn has(&self, content_ref: &str) -> Result<bool, SyncError> {
		Ok(self.get(content_ref)?.is_some())
	}

	pub fn delete(&self, content_ref: &str) -> Result<(), SyncError> {
		let write_txn = self.db.begin_write().map_err(crate::error::boxed_error)?;
		{
			let mut table = write_txn.open_table(BLOBS_TABLE).map_err(crate::error::boxed_error)?;
			table.remove(content_ref).map_err(crate::error::boxed_error)?;
		}
		write_txn.commit().map_err(crate::error::boxed_error)?;
		Ok(())
	}
}

impl ContentStore for BlobStore {
	fn put(&self, content_ref: &str, data: &[u8]) -> Result<(), SyncError> {
		BlobStore::put(self, content_ref, data)
	}

	fn get(&self, content_ref: &str) -> Result<Option<Vec<u8>>, SyncError> {
		BlobStore::get(self, content_ref)
	}

	fn delete(&self, content_ref: &str) -> Result<(), SyncError> {
		BlobStore::delete(self, content_ref)
	}
}


// vim: ts=4
