//! Storage abstraction
//!
//! §6.1 treats the persistence layer as external: the kernel talks to named,
//! transactional key-value collections through a trait, never to a concrete
//! database. `memory` supplies the in-memory reference adapter the spec
//! calls out by name (snapshot-on-begin, restore-on-abort); `blob` is a
//! concrete `redb`-backed content-addressed blob store for chunk and file
//! bodies, grounded on the teacher's `cache.rs` (`TableDefinition`,
//! `begin_write`/`commit`).

pub mod blob;
pub mod memory;
pub mod redb_store;

use crate::error::SyncError;

/// A key/value entry as returned by `Collection::scan`.
pub type ScanEntries = Vec<(Vec<u8>, Vec<u8>)>;

/// A named, ordered key-value collection within a transaction.
pub trait Collection {
	fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SyncError>;
	fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), SyncError>;
	fn delete(&mut self, key: &[u8]) -> Result<(), SyncError>;
	/// Iterate all entries in key order.
	fn scan(&self) -> Result<ScanEntries, SyncError>;
}

/// A transaction spanning one or more collections. Mutations are only
/// visible to other transactions after `commit`; `abort` (or dropping
/// without committing) discards them.
pub trait Transaction {
	fn collection(&self, name: &str) -> Result<Box<dyn Collection + '_>, SyncError>;
	fn commit(self: Box<Self>) -> Result<(), SyncError>;
	fn abort(self: Box<Self>) -> Result<(), SyncError>;
}

/// The storage adapter contract the kernel is built against.
pub trait Storage: Send + Sync {
	fn begin_write(&self) -> Result<Box<dyn Transaction + '_>, SyncError>;
	fn begin_read(&self) -> Result<Box<dyn Transaction + '_>, SyncError>;
}
