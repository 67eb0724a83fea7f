//! In-memory reference storage adapter
//!
//! The adapter §5/§6.1 refer to directly: every collection is a `BTreeMap`
//! guarded by a single mutex. A transaction clones the collections it
//! touches into a private snapshot; `commit` writes the snapshot back,
//! `abort` (or a transaction dropped without committing) simply discards it,
//! leaving the base store untouched. This mirrors the teacher's
//! `begin_write`/`commit` pairing in `cache.rs` without needing a real
//! database for tests and examples.

use super::{Collection, Storage, Transaction};
use crate::error::SyncError;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

#[derive(Default)]
pub struct MemoryStorage {
	tables: Arc<Mutex<BTreeMap<String, Table>>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		MemoryStorage::default()
	}
}

impl Storage for MemoryStorage {
	fn begin_write(&self) -> Result<Box<dyn Transaction + '_>, SyncError> {
		let snapshot = self.tables.lock().unwrap().clone();
		Ok(Box::new(MemoryTransaction {
			base: Arc::clone(&self.tables),
			snapshot: RefCell::new(snapshot),
			read_only: false,
		}))
	}

	fn begin_read(&self) -> Result<Box<dyn Transaction + '_>, SyncError> {
		let snapshot = self.tables.lock().unwrap().clone();
		Ok(Box::new(MemoryTransaction {
			base: Arc::clone(&self.tables),
			snapshot: RefCell::new(snapshot),
			read_only: true,
		}))
	}
}

struct MemoryTransaction {
	base: Arc<Mutex<BTreeMap<String, Table>>>,
	snapshot: RefCell<BTreeMap<String, Table>>,
	read_only: bool,
}

impl Transaction for MemoryTransaction {
	fn collection(&self, name: &str) -> Result<Box<dyn Collection + '_>, SyncError> {
		self.snapshot.borrow_mut().entry(name.to_string()).or_default();
		Ok(Box::new(MemoryCollection { snapshot: &self.snapshot, name: name.to_string() }))
	}

	fn commit(self: Box<Self>) -> Result<(), SyncError> {
		if self.read_only {
			return Ok(());
		}
		let mut base = self.base.lock().unwrap();
		*base = self.snapshot.into_inner();
		Ok(())
	}

	fn abort(self: Box<Self>) -> Result<(), SyncError> {
		Ok(())
	}
}

struct MemoryCollection<'a> {
	snapshot: &'a RefCell<BTreeMap<String, Table>>,
	name: String,
}

impl<'a> Collection for MemoryCollection<'a> {
	fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SyncError> {
		Ok(self.snapshot.borrow().get(&self.name).and_then(|t| t.get(key).cloned()))
	}

	fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), SyncError> {
		self.snapshot.borrow_mut().entry(self.name.clone()).or_default().insert(key.to_vec(), value.to_vec());
		Ok(())
	}

	fn delete(&mut self, key: &[u8]) -> Result<(), SyncError> {
		if let Some(table) = self.snapshot.borrow_mut().get_mut(&self.name) {
			table.remove(key);
		}
		Ok(())
	}

	fn scan(&self) -> Result<crate::storage::ScanEntries, SyncError> {
		Ok(self
			.snapshot
			.borrow()
			.get(&self.name)
			.map(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
			.unwrap_or_default())
	}
}


// vim: ts=4
