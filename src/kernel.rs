//! VFS kernel: the VNode graph and the transactional write pipeline (§3, §4.e)
//!
//! Grounded on the teacher's `state.rs` (a single struct wrapping a storage
//! handle with small, focused methods per operation) and `cache.rs`'s
//! begin/commit discipline, generalized from "one redb table of file
//! metadata" to the node/directory-entry collections described in §3.
//! Content bytes are delegated to a `ContentStore` so the kernel doesn't
//! care whether bodies live in the in-memory adapter or the `redb` blob
//! store (`storage::blob::BlobStore`).

use crate::error::{KernelError, SyncError};
use crate::event_bus::{Event, EventBus};
use crate::ids::{self, NodeId};
use crate::path;
use crate::storage::Storage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

const NODES_COLLECTION: &str = "nodes";
const CHILDREN_COLLECTION: &str = "children";

/// §3: a node is either a directory or a file. Files carry an opaque
/// content reference into a `ContentStore` instead of inline bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
	Directory,
	File,
}

/// A node in the VFS graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VNode {
	pub id: NodeId,
	pub parent: Option<NodeId>,
	pub name: String,
	pub kind: NodeKind,
	pub content_ref: Option<String>,
	pub size: u64,
	pub created_at: u64,
	pub updated_at: u64,
	pub metadata: BTreeMap<String, String>,
}

impl VNode {
	fn root() -> Self {
		VNode {
			id: ids::new_node_id(),
			parent: None,
			name: String::new(),
			kind: NodeKind::Directory,
			content_ref: None,
			size: 0,
			created_at: 0,
			updated_at: 0,
			metadata: BTreeMap::new(),
		}
	}
}

/// A byte-content backing store, kept separate from node metadata so the
/// kernel can be backed by the in-memory adapter in tests and by the `redb`
/// blob store in a real deployment.
pub trait ContentStore: Send + Sync {
	fn put(&self, content_ref: &str, data: &[u8]) -> Result<(), SyncError>;
	fn get(&self, content_ref: &str) -> Result<Option<Vec<u8>>, SyncError>;
	fn delete(&self, content_ref: &str) -> Result<(), SyncError>;
}

/// In-memory `ContentStore`, used by the in-memory storage adapter and by
/// tests.
#[derive(Default)]
pub struct MemoryContentStore {
	blobs: std::sync::Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryContentStore {
	pub fn new() -> Self {
		MemoryContentStore::default()
	}
}

impl ContentStore for MemoryContentStore {
	fn put(&self, content_ref: &str, data: &[u8]) -> Result<(), SyncError> {
		self.blobs.lock().unwrap().insert(content_ref.to_string(), data.to_vec());
		Ok(())
	}

	fn get(&self, content_ref: &str) -> Result<Option<Vec<u8>>, SyncError> {
		Ok(self.blobs.lock().unwrap().get(content_ref).cloned())
	}

	fn delete(&self, content_ref: &str) -> Result<(), SyncError> {
		self.blobs.lock().unwrap().remove(content_ref);
		Ok(())
	}
}

fn root_key() -> Vec<u8> {
	b"__root__".to_vec()
}

fn node_key(id: NodeId) -> Vec<u8> {
	id.as_bytes().to_vec()
}

fn child_key(parent: NodeId, name: &str) -> Vec<u8> {
	let mut key = parent.as_bytes().to_vec();
	key.push(0);
	key.extend_from_slice(name.as_bytes());
	key
}

/// The kernel: owns the node graph, the transactional write pipeline, and
/// event emission on commit (§4.e). One kernel mounts one `Storage`
/// adapter plus one `ContentStore`.
pub struct Kernel {
	storage: Arc<dyn Storage>,
	content: Arc<dyn ContentStore>,
	events: EventBus,
}

impl Kernel {
	/// Bring up the kernel: ensure the root node exists (§4.e root
	/// lifecycle: initialize).
	pub fn initialize(storage: Arc<dyn Storage>, content: Arc<dyn ContentStore>) -> Result<Self, SyncError> {
		let kernel = Kernel { storage, content, events: EventBus::new() };
		let txn = kernel.storage.begin_write()?;
		{
			let mut nodes = txn.collection(NODES_COLLECTION)?;
			if nodes.get(&root_key())?.is_none() {
				let root = VNode::root();
				let bytes = serde_json::to_vec(&root).map_err(crate::error::boxed_error)?;
				nodes.put(&root_key(), &bytes)?;
				nodes.put(&node_key(root.id), &bytes)?;
			}
		}
		txn.commit()?;
		Ok(kernel)
	}

	/// Tear down the kernel. No persistent resources are held beyond the
	/// storage/content handles, so shutdown is a no-op hook kept for
	/// symmetry with `initialize` (§4.e root lifecycle: shutdown).
	pub fn shutdown(self) -> Result<(), SyncError> {
		Ok(())
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.events
	}

	/// Raw storage handle, for extension subsystems (tags, assets) that keep
	/// their own collections alongside `nodes`/`children`.
	pub fn storage(&self) -> &Arc<dyn Storage> {
		&self.storage
	}

	fn root_id(&self) -> Result<NodeId, SyncError> {
		let txn = self.storage.begin_read()?;
		let nodes = txn.collection(NODES_COLLECTION)?;
		let bytes = nodes.get(&root_key())?.ok_or_else(|| {
			SyncError::Kernel(KernelError::InvalidOperation {
				message: "kernel not initialized".to_string(),
			})
		})?;
		let root: VNode = serde_json::from_slice(&bytes).map_err(crate::error::boxed_error)?;
		Ok(root.id)
	}

	pub fn get_node(&self, id: NodeId) -> Result<VNode, SyncError> {
		let txn = self.storage.begin_read()?;
		let nodes = txn.collection(NODES_COLLECTION)?;
		let bytes = nodes.get(&node_key(id))?.ok_or_else(|| {
			SyncError::Kernel(KernelError::NotFound { what: id.to_string() })
		})?;
		Ok(serde_json::from_slice(&bytes).map_err(crate::error::boxed_error)?)
	}

	/// Resolve a normalized virtual path to its node id (§4.e).
	pub fn resolve_path_to_id(&self, virtual_path: &str) -> Result<NodeId, SyncError> {
		let normalized = path::normalize(virtual_path)?;
		let mut current = self.root_id()?;
		if normalized == "/" {
			return Ok(current);
		}
		let txn = self.storage.begin_read()?;
		let children = txn.collection(CHILDREN_COLLECTION)?;
		for segment in normalized.trim_start_matches('/').split('/') {
			let bytes = children.get(&child_key(current, segment))?.ok_or_else(|| {
				SyncError::Kernel(KernelError::NotFound { what: normalized.clone() })
			})?;
			current =
				NodeId::from_slice(&bytes).map_err(|e| SyncError::Other { message: e.to_string() })?;
		}
		Ok(current)
	}

	pub fn get_node_by_path(&self, virtual_path: &str) -> Result<VNode, SyncError> {
		let id = self.resolve_path_to_id(virtual_path)?;
		self.get_node(id)
	}

	/// Reconstruct a node's current virtual path by walking `parent`
	/// pointers; `VNode` itself carries no path field, only `parent`/`name`.
	pub fn path_for(&self, id: NodeId) -> Result<String, SyncError> {
		let mut segments = Vec::new();
		let mut current = self.get_node(id)?;
		while let Some(parent_id) = current.parent {
			segments.push(current.name.clone());
			current = self.get_node(parent_id)?;
		}
		segments.reverse();
		Ok(format!("/{}", segments.join("/")))
	}

	pub fn exists(&self, virtual_path: &str) -> Result<bool, SyncError> {
		match self.resolve_path_to_id(virtual_path) {
			Ok(_) => Ok(true),
			Err(SyncError::Kernel(KernelError::NotFound { .. })) => Ok(false),
			Err(e) => Err(e),
		}
	}

	/// List the direct children of a directory node (§4.e readdir).
	pub fn readdir(&self, virtual_path: &str) -> Result<Vec<VNode>, SyncError> {
		let dir_id = self.resolve_path_to_id(virtual_path)?;
		let dir = self.get_node(dir_id)?;
		if dir.kind != NodeKind::Directory {
			return Err(SyncError::Kernel(KernelError::InvalidOperation {
				message: format!("{} is not a directory", virtual_path),
			}));
		}
		let txn = self.storage.begin_read()?;
		let children = txn.collection(CHILDREN_COLLECTION)?;
		let nodes = txn.collection(NODES_COLLECTION)?;
		let prefix = {
			let mut p = dir_id.as_bytes().to_vec();
			p.push(0);
			p
		};
		let mut out = Vec::new();
		for (key, value) in children.scan()? {
			if key.starts_with(&prefix) {
				let child_id = NodeId::from_slice(&value)
					.map_err(|e| SyncError::Other { message: e.to_string() })?;
				let node_bytes = nodes.get(&node_key(child_id))?.ok_or_else(|| {
					SyncError::Kernel(KernelError::NotFound { what: child_id.to_string() })
				})?;
				out.push(serde_json::from_slice(&node_bytes).map_err(crate::error::boxed_error)?);
			}
		}
		Ok(out)
	}

	/// Create a node at `virtual_path` (§4.e createNode). The parent
	/// directory must already exist.
	pub fn create_node(
		&self,
		virtual_path: &str,
		kind: NodeKind,
		now_ms: u64,
	) -> Result<VNode, SyncError> {
		let normalized = path::normalize(virtual_path)?;
		if normalized == "/" {
			return Err(SyncError::Kernel(KernelError::InvalidOperation {
				message: "cannot create the root node".to_string(),
			}));
		}
		let parent_path = path::dirname(&normalized);
		let name = path::basename(&normalized).to_string();
		let parent_id = self.resolve_path_to_id(&parent_path)?;

		let txn = self.storage.begin_write()?;
		let already_exists = {
			let children = txn.collection(CHILDREN_COLLECTION)?;
			children.get(&child_key(parent_id, &name))?.is_some()
		};
		if already_exists {
			txn.abort()?;
			return Err(SyncError::Kernel(KernelError::AlreadyExists { path: normalized }));
		}
		let node = VNode {
			id: ids::new_node_id(),
			parent: Some(parent_id),
			name: name.clone(),
			kind,
			content_ref: None,
			size: 0,
			created_at: now_ms,
			updated_at: now_ms,
			metadata: BTreeMap::new(),
		};
		{
			let mut nodes = txn.collection(NODES_COLLECTION)?;
			let bytes = serde_json::to_vec(&node).map_err(crate::error::boxed_error)?;
			nodes.put(&node_key(node.id), &bytes)?;
		}
		{
			let mut children = txn.collection(CHILDREN_COLLECTION)?;
			children.put(&child_key(parent_id, &name), node.id.as_bytes())?;
		}
		txn.commit()?;

		self.events.publish(Event::NodeCreated { node_id: node.id, path: normalized });
		Ok(node)
	}

	/// Create a node only if it doesn't already exist, returning the
	/// existing node otherwise (§4.e createNodeIfNotExists).
	pub fn create_node_if_not_exists(
		&self,
		virtual_path: &str,
		kind: NodeKind,
		now_ms: u64,
	) -> Result<VNode, SyncError> {
		match self.get_node_by_path(virtual_path) {
			Ok(node) => Ok(node),
			Err(SyncError::Kernel(KernelError::NotFound { .. })) => {
				self.create_node(virtual_path, kind, now_ms)
			}
			Err(e) => Err(e),
		}
	}

	/// Create every missing directory along `virtual_path` (§4.e
	/// ensureDirectory).
	pub fn ensure_directory(&self, virtual_path: &str, now_ms: u64) -> Result<VNode, SyncError> {
		let normalized = path::normalize(virtual_path)?;
		if normalized == "/" {
			return self.get_node_by_path("/");
		}
		let mut built = String::new();
		let mut last = None;
		for segment in normalized.trim_start_matches('/').split('/') {
			built = if built.is_empty() { format!("/{}", segment) } else { format!("{}/{}", built, segment) };
			last = Some(self.create_node_if_not_exists(&built, NodeKind::Directory, now_ms)?);
		}
		Ok(last.unwrap())
	}

	/// Read the content bytes of a file node (§4.e read).
	pub fn read(&self, virtual_path: &str) -> Result<Vec<u8>, SyncError> {
		let node = self.get_node_by_path(virtual_path)?;
		self.read_node(&node)
	}

	/// Read the content bytes of a file node by id, for callers (e.g. the
	/// sync executor) that already resolved the node.
	pub fn read_by_id(&self, id: NodeId) -> Result<Vec<u8>, SyncError> {
		let node = self.get_node(id)?;
		self.read_node(&node)
	}

	fn read_node(&self, node: &VNode) -> Result<Vec<u8>, SyncError> {
		if node.kind != NodeKind::File {
			return Err(SyncError::Kernel(KernelError::InvalidOperation {
				message: format!("{} is a directory", node.name),
			}));
		}
		match &node.content_ref {
			Some(hash) => Ok(self.content.get(hash)?.unwrap_or_default()),
			None => Ok(Vec::new()),
		}
	}

	/// Write content bytes to a file node, creating it if necessary
	/// (§4.e write). `contentRef` is an opaque handle distinct from the
	/// SHA-256 `contentHash` the sync wire protocol computes separately
	/// (§4.l/§6.3): it is assigned once and stays stable across rewrites
	/// (§3.1), with the blob store overwriting the payload under that same
	/// key rather than leaking the superseded one.
	pub fn write(&self, virtual_path: &str, data: &[u8], now_ms: u64) -> Result<VNode, SyncError> {
		let normalized = path::normalize(virtual_path)?;
		let existing = self.get_node_by_path(&normalized).ok();
		let id = match existing {
			Some(node) => node.id,
			None => self.create_node(&normalized, NodeKind::File, now_ms)?.id,
		};

		let txn = self.storage.begin_write()?;
		let (updated, content_ref) = {
			let mut nodes = txn.collection(NODES_COLLECTION)?;
			let bytes = nodes.get(&node_key(id))?.ok_or_else(|| {
				SyncError::Kernel(KernelError::NotFound { what: id.to_string() })
			})?;
			let mut node: VNode = serde_json::from_slice(&bytes).map_err(crate::error::boxed_error)?;
			let content_ref = node.content_ref.clone().unwrap_or_else(|| ids::new_node_id().to_string());
			node.content_ref = Some(content_ref.clone());
			node.size = data.len() as u64;
			node.updated_at = now_ms;
			let bytes = serde_json::to_vec(&node).map_err(crate::error::boxed_error)?;
			nodes.put(&node_key(id), &bytes)?;
			(node, content_ref)
		};
		txn.commit()?;

		self.content.put(&content_ref, data)?;
		self.events.publish(Event::NodeUpdated { node_id: id, path: normalized });
		Ok(updated)
	}

	/// Remove a node and, when `recursive`, its whole subtree (§4.e unlink,
	/// §4.p). A non-empty directory is rejected unless `recursive` is set.
	/// Returns the ids of every node removed, deepest-first, and deletes
	/// each removed file's content blob so no blob outlives its VNode
	/// (§3.1, §8 unlink-completeness).
	pub fn unlink(&self, virtual_path: &str, recursive: bool) -> Result<Vec<NodeId>, SyncError> {
		let normalized = path::normalize(virtual_path)?;
		let node = self.get_node_by_path(&normalized)?;
		if node.parent.is_none() {
			return Err(SyncError::Kernel(KernelError::InvalidOperation {
				message: "cannot unlink the root".to_string(),
			}));
		}
		if node.kind == NodeKind::Directory && !recursive && !self.readdir(&normalized)?.is_empty() {
			return Err(SyncError::Kernel(KernelError::InvalidOperation {
				message: format!("{} is not empty", normalized),
			}));
		}

		let mut deleted = Vec::new();
		self.unlink_subtree(&node, &normalized, &mut deleted)?;

		self.events.publish(Event::NodeDeleted { node_id: node.id, path: normalized });
		Ok(deleted)
	}

	fn unlink_subtree(&self, node: &VNode, node_path: &str, deleted: &mut Vec<NodeId>) -> Result<(), SyncError> {
		if node.kind == NodeKind::Directory {
			for child in self.readdir(node_path)? {
				let child_path = path::join(node_path, &child.name)?;
				self.unlink_subtree(&child, &child_path, deleted)?;
			}
		}

		let txn = self.storage.begin_write()?;
		{
			let mut nodes = txn.collection(NODES_COLLECTION)?;
			nodes.delete(&node_key(node.id))?;
		}
		if let Some(parent_id) = node.parent {
			let mut children = txn.collection(CHILDREN_COLLECTION)?;
			children.delete(&child_key(parent_id, &node.name))?;
		}
		txn.commit()?;

		if node.kind == NodeKind::File {
			if let Some(content_ref) = &node.content_ref {
				self.content.delete(content_ref)?;
			}
		}
		deleted.push(node.id);
		Ok(())
	}

	/// Move a node to a new path (§4.e move). Renames the node under its
	/// new parent/name in a single transaction.
	pub fn move_node(&self, from_path: &str, to_path: &str, now_ms: u64) -> Result<VNode, SyncError> {
		let from_normalized = path::normalize(from_path)?;
		let to_normalized = path::normalize(to_path)?;
		let node = self.get_node_by_path(&from_normalized)?;
		let old_parent = node.parent.ok_or_else(|| {
			SyncError::Kernel(KernelError::InvalidOperation { message: "cannot move the root".to_string() })
		})?;
		if path::is_sub_path(&from_normalized, &to_normalized) {
			return Err(SyncError::Kernel(KernelError::InvalidOperation {
				message: format!("cannot move {} into its own descendant {}", from_normalized, to_normalized),
			}));
		}

		let new_parent_path = path::dirname(&to_normalized);
		let new_name = path::basename(&to_normalized).to_string();
		let new_parent_id = self.resolve_path_to_id(&new_parent_path)?;

		let txn = self.storage.begin_write()?;
		let already_exists = {
			let children = txn.collection(CHILDREN_COLLECTION)?;
			children.get(&child_key(new_parent_id, &new_name))?.is_some()
		};
		if already_exists {
			txn.abort()?;
			return Err(SyncError::Kernel(KernelError::AlreadyExists { path: to_normalized }));
		}
		let updated = {
			let mut nodes = txn.collection(NODES_COLLECTION)?;
			let bytes = nodes.get(&node_key(node.id))?.unwrap();
			let mut updated: VNode = serde_json::from_slice(&bytes).map_err(crate::error::boxed_error)?;
			updated.parent = Some(new_parent_id);
			updated.name = new_name.clone();
			updated.updated_at = now_ms;
			let bytes = serde_json::to_vec(&updated).map_err(crate::error::boxed_error)?;
			nodes.put(&node_key(node.id), &bytes)?;
			updated
		};
		{
			let mut children = txn.collection(CHILDREN_COLLECTION)?;
			children.delete(&child_key(old_parent, &node.name))?;
			children.put(&child_key(new_parent_id, &new_name), node.id.as_bytes())?;
		}
		txn.commit()?;

		self.events.publish(Event::NodeMoved {
			node_id: node.id,
			from_path: from_normalized,
			to_path: to_normalized,
		});
		Ok(updated)
	}

	/// Copy a file node to a new path (§4.e copy). Directories are not
	/// recursively copied here; asset-directory cascade copy lives in the
	/// `assets` module, which calls this per leaf node.
	pub fn copy_node(&self, from_path: &str, to_path: &str, now_ms: u64) -> Result<VNode, SyncError> {
		let from_normalized = path::normalize(from_path)?;
		let source = self.get_node_by_path(&from_normalized)?;
		if source.kind != NodeKind::File {
			return Err(SyncError::Kernel(KernelError::InvalidOperation {
				message: "copy_node only supports file nodes; see assets:: for directories".to_string(),
			}));
		}
		let new_node = self.create_node(to_path, NodeKind::File, now_ms)?;
		let to_normalized = path::normalize(to_path)?;

		// Copy the blob under a fresh contentRef rather than sharing the
		// source's, so unlinking either copy never reaps the other's bytes.
		let new_content_ref = match &source.content_ref {
			Some(src_ref) => {
				let data = self.content.get(src_ref)?.unwrap_or_default();
				let fresh_ref = ids::new_node_id().to_string();
				self.content.put(&fresh_ref, &data)?;
				Some(fresh_ref)
			}
			None => None,
		};

		let txn = self.storage.begin_write()?;
		let updated = {
			let mut nodes = txn.collection(NODES_COLLECTION)?;
			let bytes = nodes.get(&node_key(new_node.id))?.unwrap();
			let mut updated: VNode = serde_json::from_slice(&bytes).map_err(crate::error::boxed_error)?;
			updated.content_ref = new_content_ref;
			updated.size = source.size;
			updated.updated_at = now_ms;
			let bytes = serde_json::to_vec(&updated).map_err(crate::error::boxed_error)?;
			nodes.put(&node_key(new_node.id), &bytes)?;
			updated
		};
		txn.commit()?;

		self.events.publish(Event::NodeCopied {
			node_id: source.id,
			new_node_id: new_node.id,
			from_path: from_normalized,
			to_path: to_normalized,
		});
		Ok(updated)
	}

	/// Merge `updates` into a node's metadata map in a single transaction.
	/// Used by extension subsystems (assets, sync) that need to stamp
	/// back-pointers or control fields without going through `write`.
	pub fn set_metadata(
		&self,
		id: NodeId,
		updates: BTreeMap<String, String>,
		now_ms: u64,
	) -> Result<VNode, SyncError> {
		let txn = self.storage.begin_write()?;
		let updated = {
			let mut nodes = txn.collection(NODES_COLLECTION)?;
			let bytes = nodes.get(&node_key(id))?.ok_or_else(|| {
				SyncError::Kernel(KernelError::NotFound { what: id.to_string() })
			})?;
			let mut node: VNode = serde_json::from_slice(&bytes).map_err(crate::error::boxed_error)?;
			node.metadata.extend(updates);
			node.updated_at = now_ms;
			let bytes = serde_json::to_vec(&node).map_err(crate::error::boxed_error)?;
			nodes.put(&node_key(id), &bytes)?;
			node
		};
		txn.commit()?;
		Ok(updated)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::storage::memory::MemoryStorage;

	fn new_kernel() -> Kernel {
		Kernel::initialize(Arc::new(MemoryStorage::new()), Arc::new(MemoryContentStore::new())).unwrap()
	}

	#[test]
	fn test_initialize_creates_root() {
		let kernel = new_kernel();
		assert!(kernel.exists("/").unwrap());
		assert_eq!(kernel.get_node_by_path("/").unwrap().kind, NodeKind::Directory);
	}

	#[test]
	fn test_create_and_read_write() {
		let kernel = new_kernel();
		kernel.ensure_directory("/docs", 1).unwrap();
		kernel.write("/docs/a.txt", b"hello", 2).unwrap();
		assert_eq!(kernel.read("/docs/a.txt").unwrap(), b"hello");
	}

	#[test]
	fn test_write_updates_existing_node() {
		let kernel = new_kernel();
		kernel.write("/a.txt", b"v1", 1).unwrap();
		kernel.write("/a.txt", b"v2", 2).unwrap();
		assert_eq!(kernel.read("/a.txt").unwrap(), b"v2");
		assert_eq!(kernel.readdir("/").unwrap().len(), 1);
	}

	#[test]
	fn test_readdir_lists_children() {
		let kernel = new_kernel();
		kernel.write("/a.txt", b"1", 1).unwrap();
		kernel.write("/b.txt", b"2", 1).unwrap();
		let mut names: Vec<String> = kernel.readdir("/").unwrap().into_iter().map(|n| n.name).collect();
		names.sort();
		assert_eq!(names, vec!["a.txt".to_string(), "b.txt".to_string()]);
	}

	#[test]
	fn test_unlink_removes_node() {
		let kernel = new_kernel();
		kernel.write("/a.txt", b"1", 1).unwrap();
		let deleted = kernel.unlink("/a.txt", false).unwrap();
		assert!(!kernel.exists("/a.txt").unwrap());
		assert_eq!(deleted.len(), 1);
	}

	#[test]
	fn test_unlink_nonempty_dir_fails() {
		let kernel = new_kernel();
		kernel.ensure_directory("/docs", 1).unwrap();
		kernel.write("/docs/a.txt", b"1", 1).unwrap();
		assert!(kernel.unlink("/docs", false).is_err());
	}

	#[test]
	fn test_unlink_recursive_removes_descendants_and_blob() {
		let kernel = new_kernel();
		kernel.ensure_directory("/docs", 1).unwrap();
		let file = kernel.write("/docs/a.txt", b"1", 1).unwrap();
		let content_ref = file.content_ref.clone().unwrap();
		let deleted = kernel.unlink("/docs", true).unwrap();
		assert_eq!(deleted.len(), 2);
		assert!(!kernel.exists("/docs").unwrap());
		assert!(!kernel.exists("/docs/a.txt").unwrap());
		assert!(kernel.content.get(&content_ref).unwrap().is_none());
	}

	#[test]
	fn test_move_node() {
		let kernel = new_kernel();
		kernel.write("/a.txt", b"1", 1).unwrap();
		kernel.move_node("/a.txt", "/b.txt", 2).unwrap();
		assert!(!kernel.exists("/a.txt").unwrap());
		assert_eq!(kernel.read("/b.txt").unwrap(), b"1");
	}

	#[test]
	fn test_move_into_own_descendant_rejected() {
		let kernel = new_kernel();
		kernel.ensure_directory("/a/b", 1).unwrap();
		assert!(kernel.move_node("/a", "/a/b/c", 2).is_err());
		assert!(kernel.exists("/a/b").unwrap());
	}

	#[test]
	fn test_copy_node() {
		let kernel = new_kernel();
		kernel.write("/a.txt", b"content", 1).unwrap();
		kernel.copy_node("/a.txt", "/b.txt", 2).unwrap();
		assert_eq!(kernel.read("/a.txt").unwrap(), b"content");
		assert_eq!(kernel.read("/b.txt").unwrap(), b"content");
	}

	#[test]
	fn test_copy_node_gets_a_fresh_content_ref() {
		let kernel = new_kernel();
		let a = kernel.write("/a.txt", b"content", 1).unwrap();
		let b = kernel.copy_node("/a.txt", "/b.txt", 2).unwrap();
		assert_ne!(a.content_ref, b.content_ref);
		kernel.unlink("/a.txt", false).unwrap();
		assert_eq!(kernel.read("/b.txt").unwrap(), b"content");
	}

	#[test]
	fn test_write_keeps_content_ref_stable_across_rewrites() {
		let kernel = new_kernel();
		let v1 = kernel.write("/a.txt", b"v1", 1).unwrap();
		let v2 = kernel.write("/a.txt", b"v2", 2).unwrap();
		assert_eq!(v1.content_ref, v2.content_ref);
		assert_eq!(kernel.read("/a.txt").unwrap(), b"v2");
	}

	#[test]
	fn test_create_duplicate_fails() {
		let kernel = new_kernel();
		kernel.create_node("/a", NodeKind::Directory, 1).unwrap();
		assert!(kernel.create_node("/a", NodeKind::Directory, 1).is_err());
	}

	#[test]
	fn test_ensure_directory_creates_nested_path() {
		let kernel = new_kernel();
		kernel.ensure_directory("/a/b/c", 1).unwrap();
		assert!(kernel.exists("/a").unwrap());
		assert!(kernel.exists("/a/b").unwrap());
		assert!(kernel.exists("/a/b/c").unwrap());
	}
}

// vim: ts=4
