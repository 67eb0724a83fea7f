//! Tag subsystem (§3 Tag / Node-tag relation, §4.i)
//!
//! Grounded on `kernel.rs`'s own collection idiom (named key-value
//! collections opened per-transaction, composite byte keys for indexed
//! relations) rather than a teacher file — the teacher has no indexed
//! secondary-relation subsystem, so this reuses the kernel's own storage
//! pattern for the global tag table and the `(nodeId, tagName)` relation.

use crate::error::{SyncError, TagError};
use crate::event_bus::Event;
use crate::ids::NodeId;
use crate::kernel::Kernel;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const TAGS_COLLECTION: &str = "tags";
const NODE_TAGS_COLLECTION: &str = "node_tags";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
	pub name: String,
	pub color: Option<String>,
	pub ref_count: u64,
	pub is_protected: bool,
	pub created_at: u64,
}

fn node_tag_key(node_id: NodeId, tag: &str) -> Vec<u8> {
	let mut key = node_id.as_bytes().to_vec();
	key.push(0);
	key.extend_from_slice(tag.as_bytes());
	key
}

pub struct TagStore<'k> {
	kernel: &'k Kernel,
}

impl<'k> TagStore<'k> {
	pub fn new(kernel: &'k Kernel) -> Self {
		TagStore { kernel }
	}

	fn load_tag(&self, name: &str) -> Result<Option<Tag>, SyncError> {
		let txn = self.kernel.storage().begin_read()?;
		let tags = txn.collection(TAGS_COLLECTION)?;
		match tags.get(name.as_bytes())? {
			Some(bytes) => Ok(Some(serde_json::from_slice(&bytes).map_err(crate::error::boxed_error)?)),
			None => Ok(None),
		}
	}

	fn save_tag(&self, tag: &Tag) -> Result<(), SyncError> {
		let txn = self.kernel.storage().begin_write()?;
		{
			let mut tags = txn.collection(TAGS_COLLECTION)?;
			let bytes = serde_json::to_vec(tag).map_err(crate::error::boxed_error)?;
			tags.put(tag.name.as_bytes(), &bytes)?;
		}
		txn.commit()
	}

	/// §4.i: ensure the global tag row exists, insert the relation if
	/// absent, and increment `refCount`.
	pub fn add_tag_to_node(&self, node_id: NodeId, tag_name: &str, now_ms: u64) -> Result<(), SyncError> {
		let mut tag = self.load_tag(tag_name)?.unwrap_or_else(|| Tag {
			name: tag_name.to_string(),
			color: None,
			ref_count: 0,
			is_protected: false,
			created_at: now_ms,
		});

		let txn = self.kernel.storage().begin_write()?;
		let already_related = {
			let relations = txn.collection(NODE_TAGS_COLLECTION)?;
			relations.get(&node_tag_key(node_id, tag_name))?.is_some()
		};
		if !already_related {
			let mut relations = txn.collection(NODE_TAGS_COLLECTION)?;
			relations.put(&node_tag_key(node_id, tag_name), b"1")?;
			tag.ref_count += 1;
		}
		txn.commit()?;
		self.save_tag(&tag)?;
		Ok(())
	}

	/// §4.i: delete all matching relations and clamp `refCount` to zero from
	/// below.
	pub fn remove_tag_from_node(&self, node_id: NodeId, tag_name: &str) -> Result<(), SyncError> {
		let txn = self.kernel.storage().begin_write()?;
		let was_related = {
			let relations = txn.collection(NODE_TAGS_COLLECTION)?;
			relations.get(&node_tag_key(node_id, tag_name))?.is_some()
		};
		if was_related {
			let mut relations = txn.collection(NODE_TAGS_COLLECTION)?;
			relations.delete(&node_tag_key(node_id, tag_name))?;
		}
		txn.commit()?;

		if was_related {
			if let Some(mut tag) = self.load_tag(tag_name)? {
				tag.ref_count = tag.ref_count.saturating_sub(1);
				self.save_tag(&tag)?;
			}
		}
		Ok(())
	}

	pub fn node_tags(&self, node_id: NodeId) -> Result<BTreeSet<String>, SyncError> {
		let txn = self.kernel.storage().begin_read()?;
		let relations = txn.collection(NODE_TAGS_COLLECTION)?;
		let prefix = {
			let mut p = node_id.as_bytes().to_vec();
			p.push(0);
			p
		};
		let mut out = BTreeSet::new();
		for (key, _) in relations.scan()? {
			if key.starts_with(&prefix) {
				out.insert(String::from_utf8_lossy(&key[prefix.len()..]).to_string());
			}
		}
		Ok(out)
	}

	/// §4.i `setNodeTags`: diff current vs. target sets and issue add/remove
	/// in one logical step.
	pub fn set_node_tags(&self, node_id: NodeId, target: &BTreeSet<String>, now_ms: u64) -> Result<(), SyncError> {
		let current = self.node_tags(node_id)?;
		for tag in target.difference(&current) {
			self.add_tag_to_node(node_id, tag, now_ms)?;
		}
		for tag in current.difference(target) {
			self.remove_tag_from_node(node_id, tag)?;
		}
		Ok(())
	}

	/// §4.i `batchSetTags`: apply several `setNodeTags` calls.
	pub fn batch_set_tags(
		&self,
		updates: &BTreeMap<NodeId, BTreeSet<String>>,
		now_ms: u64,
	) -> Result<(), SyncError> {
		for (node_id, tags) in updates {
			self.set_node_tags(*node_id, tags, now_ms)?;
		}
		Ok(())
	}

	/// §4.i `deleteTag`: rejects protected tags, else removes the global row
	/// and all relations.
	pub fn delete_tag(&self, tag_name: &str) -> Result<(), SyncError> {
		let tag = self
			.load_tag(tag_name)?
			.ok_or_else(|| SyncError::Tag(TagError::NotFound { name: tag_name.to_string() }))?;
		if tag.is_protected {
			return Err(SyncError::Tag(TagError::ProtectedTag { name: tag_name.to_string() }));
		}
		let txn = self.kernel.storage().begin_write()?;
		let stale_keys = {
			let relations = txn.collection(NODE_TAGS_COLLECTION)?;
			relations
				.scan()?
				.into_iter()
				.filter(|(key, _)| key.ends_with(format!("\0{}", tag_name).as_bytes()))
				.map(|(key, _)| key)
				.collect::<Vec<_>>()
		};
		{
			let mut relations = txn.collection(NODE_TAGS_COLLECTION)?;
			for key in &stale_keys {
				relations.delete(key)?;
			}
			let mut tags = txn.collection(TAGS_COLLECTION)?;
			tags.delete(tag_name.as_bytes())?;
		}
		txn.commit()
	}

	/// §4.i `cleanupNodeTags`, triggered from the NODE_DELETED event: remove
	/// every relation of the deleted node and decrement each tag's refcount.
	pub fn cleanup_node_tags(&self, node_id: NodeId) -> Result<(), SyncError> {
		for tag_name in self.node_tags(node_id)? {
			self.remove_tag_from_node(node_id, &tag_name)?;
		}
		Ok(())
	}

	/// Wire `cleanup_node_tags` to the kernel's event bus so deletions always
	/// clean up tag relations without callers remembering to do it.
	pub fn subscribe_cleanup(kernel: std::sync::Arc<Kernel>) {
		let bus = kernel.event_bus().clone();
		bus.subscribe("node.deleted", move |event: &Event| {
			if let Event::NodeDeleted { node_id, .. } = event {
				let store = TagStore::new(&kernel);
				if let Err(e) = store.cleanup_node_tags(*node_id) {
					crate::logging::warn!(%node_id, error = %e, "tag cleanup failed for deleted node");
				}
			}
		});
	}
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
	fn test_add_tag_increments_refcount() {
		let kernel = new_kernel();
		let node = kernel.create_node("/a.txt", crate::kernel::NodeKind::File, 1).unwrap();
		let store = TagStore::new(&kernel);
		store.add_tag_to_node(node.id, "important", 1).unwrap();
		store.add_tag_to_node(node.id, "important", 1).unwrap();
		let tag = store.load_tag("important").unwrap().unwrap();
		assert_eq!(tag.ref_count, 1);
	}

	#[test]
	fn test_remove_tag_decrements_refcount() {
		let kernel = new_kernel();
		let node = kernel.create_node("/a.txt", crate::kernel::NodeKind::File, 1).unwrap();
		let store = TagStore::new(&kernel);
		store.add_tag_to_node(node.id, "important", 1).unwrap();
		store.remove_tag_from_node(node.id, "important").unwrap();
		let tag = store.load_tag("important").unwrap().unwrap();
		assert_eq!(tag.ref_count, 0);
	}

	#[test]
	fn test_set_node_tags_diffs() {
		let kernel = new_kernel();
		let node = kernel.create_node("/a.txt", crate::kernel::NodeKind::File, 1).unwrap();
		let store = TagStore::new(&kernel);
		store.add_tag_to_node(node.id, "x", 1).unwrap();
		let target: BTreeSet<String> = BTreeSet::from(["y".to_string()]);
		store.set_node_tags(node.id, &target, 1).unwrap();
		assert_eq!(store.node_tags(node.id).unwrap(), target);
	}

	#[test]
	fn test_delete_protected_tag_fails() {
		let kernel = new_kernel();
		let node = kernel.create_node("/a.txt", crate::kernel::NodeKind::File, 1).unwrap();
		let store = TagStore::new(&kernel);
		store.add_tag_to_node(node.id, "locked", 1).unwrap();
		let mut tag = store.load_tag("locked").unwrap().unwrap();
		tag.is_protected = true;
		store.save_tag(&tag).unwrap();
		assert!(store.delete_tag("locked").is_err());
	}

	#[test]
	fn test_cleanup_node_tags_removes_all_relations() {
		let kernel = new_kernel();
		let node = kernel.create_node("/a.txt", crate::kernel::NodeKind::File, 1).unwrap();
		let store = TagStore::new(&kernel);
		store.add_tag_to_node(node.id, "x", 1).unwrap();
		store.add_tag_to_node(node.id, "y", 1).unwrap();
		store.cleanup_node_tags(node.id).unwrap();
		assert!(store.node_tags(node.id).unwrap().is_empty());
	}
}

// vim: ts=4
