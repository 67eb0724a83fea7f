//! Persistent redb-backed storage adapter
//!
//! Grounded on `blob.rs`'s redb usage (a single `redb::Database`, one
//! `TableDefinition` per table, begin_write/commit per mutation), generalized
//! from one fixed blob table to the kernel's closed set of named collections
//! so a CLI invocation can open the same on-disk graph across process runs,
//! the way the teacher's `cache.rs` persists metadata between `syncr`
//! invocations rather than rebuilding it from a directory walk each time.

use crate::error::SyncError;
use crate::storage::{Collection, Storage, Transaction};
use redb::{ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

const NODES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("nodes");
const CHILDREN: TableDefinition<&[u8], &[u8]> = TableDefinition::new("children");
const TAGS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("tags");
const NODE_TAGS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("node_tags");

const KNOWN_TABLES: [&str; 4] = ["nodes", "children", "tags", "node_tags"];

fn table_for(name: &str) -> Result<TableDefinition<'static, &'static [u8], &'static [u8]>, SyncError> {
	match name {
		"nodes" => Ok(NODES),
		"children" => Ok(CHILDREN),
		"tags" => Ok(TAGS),
		"node_tags" => Ok(NODE_TAGS),
		other => Err(SyncError::Other { message: format!("unknown collection: {other}") }),
	}
}

pub struct RedbStorage {
	db: redb::Database,
}

impl RedbStorage {
	/// Open or create a database at `db_path`, pre-creating every known
	/// collection's table so reads never race its creation.
	pub fn open(db_path: &Path) -> Result<Self, SyncError> {
		let db = redb::Database::create(db_path).map_err(crate::error::boxed_error)?;
		{
			let write_txn = db.begin_write().map_err(crate::error::boxed_error)?;
			for name in KNOWN_TABLES {
				let _ = write_txn.open_table(table_for(name)?).map_err(crate::error::boxed_error)?;
			}
			write_txn.commit().map_err(crate::error::boxed_error)?;
		}
		Ok(RedbStorage { db })
	}
}

impl Storage for RedbStorage {
	fn begin_write(&self) -> Result<Box<dyn Transaction + '_>, SyncError> {
		let txn = self.db.begin_write().map_err(crate::error::boxed_error)?;
		Ok(Box::new(RedbWriteTransaction { txn }))
	}

	fn begin_read(&self) -> Result<Box<dyn Transaction + '_>, SyncError> {
		let txn = self.db.begin_read().map_err(crate::error::boxed_error)?;
		Ok(Box::new(RedbReadTransaction { txn }))
	}
}

struct RedbWriteTransaction {
	txn: redb::WriteTransaction,
}

impl Transaction for RedbWriteTransaction {
	fn collection(&self, name: &str) -> Result<Box<dyn Collection + '_>, SyncError> {
		Ok(Box::new(RedbWriteCollection { txn: &self.txn, def: table_for(name)? }))
	}

	fn commit(self: Box<Self>) -> Result<(), SyncError> {
		self.txn.commit().map_err(crate::error::boxed_error)?;
		Ok(())
	}

	fn abort(self: Box<Self>) -> Result<(), SyncError> {
		self.txn.abort().map_err(crate::error::boxed_error)?;
		Ok(())
	}
}

/// Opens its table fresh on every call rather than holding one across the
/// transaction's lifetime, so readdir-style callers can have two collections
/// (e.g. `children` and `nodes`) open at once without redb's table-tracking
/// mutex deadlocking against itself.
struct RedbWriteCollection<'a> {
	txn: &'a redb::WriteTransaction,
	def: TableDefinition<'static, &'static [u8], &'static [u8]>,
}

impl Collection for RedbWriteCollection<'_> {
	fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SyncError> {
		let table = self.txn.open_table(self.def).map_err(crate::error::boxed_error)?;
		let value = table.get(key).map_err(crate::error::boxed_error)?.map(|v| v.value().to_vec());
		Ok(value)
	}

	fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), SyncError> {
		let mut table = self.txn.open_table(self.def).map_err(crate::error::boxed_error)?;
		table.insert(key, value).map_err(crate::error::boxed_error)?;
		Ok(())
	}

	fn delete(&mut self, key: &[u8]) -> Result<(), SyncError> {
		let mut table = self.txn.open_table(self.def).map_err(crate::error::boxed_error)?;
		table.remove(key).map_err(crate::error::boxed_error)?;
		Ok(())
	}

	fn scan(&self) -> Result<crate::storage::ScanEntries, SyncError> {
		let table = self.txn.open_table(self.def).map_err(crate::error::boxed_error)?;
		let mut out = Vec::new();
		for entry in table.iter().map_err(crate::error::boxed_error)? {
			let (k, v) = entry.map_err(crate::error::boxed_error)?;
			out.push((k.value().to_vec(), v.value().to_vec()));
		}
		Ok(out)
	}
}

struct RedbReadTransaction {
	txn: redb::ReadTransaction,
}

impl Transaction for RedbReadTransaction {
	fn collection(&self, name: &str) -> Result<Box<dyn Collection + '_>, SyncError> {
		let table = self.txn.open_table(table_for(name)?).map_err(crate::error::boxed_error)?;
		Ok(Box::new(RedbReadCollection { table }))
	}

	fn commit(self: Box<Self>) -> Result<(), SyncError> {
		Ok(())
	}

	fn abort(self: Box<Self>) -> Result<(), SyncError> {
		Ok(())
	}
}

struct RedbReadCollection {
	table: redb::ReadOnlyTable<&'static [u8], &'static [u8]>,
}

impl Collection for RedbReadCollection {
	fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SyncError> {
		let value = self.table.get(key).map_err(crate::error::boxed_error)?.map(|v| v.value().to_vec());
		Ok(value)
	}

	fn put(&mut self, _key: &[u8], _value: &[u8]) -> Result<(), SyncError> {
		Err(SyncError::Other { message: "cannot write through a read-only transaction".to_string() })
	}

	fn delete(&mut self, _key: &[u8]) -> Result<(), SyncError> {
		Err(SyncError::Other { message: "cannot write through a read-only transaction".to_string() })
	}

	fn scan(&self) -> Result<crate::storage::ScanEntries, SyncError> {
		let mut out = Vec::new();
		for entry in self.table.iter().map_err(crate::error::boxed_error)? {
			let (k, v) = entry.map_err(crate::error::boxed_error)?;
			out.push((k.value().to_vec(), v.value().to_vec()));
		}
		Ok(out)
	}
}


// vim: ts=4
