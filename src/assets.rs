//! Asset subsystem (§3 Asset relation, §4.j)
//!
//! No direct teacher analog (the teacher has no auxiliary-directory
//! concept); grounded on `kernel.rs`'s own move/copy primitives and
//! `tags.rs`'s event-subscription idiom, since this subsystem is defined
//! entirely in terms of kernel operations plus bidirectional metadata
//! back-pointers.

use crate::error::{AssetError, SyncError};
use crate::ids::NodeId;
use crate::kernel::{Kernel, NodeKind};
use std::collections::BTreeSet;

const ASSET_DIR_ID_KEY: &str = "assetDirId";
const OWNER_ID_KEY: &str = "ownerId";
const IS_ASSET_DIR_KEY: &str = "isAssetDir";

/// The deterministic asset-directory path for an owner (§3): a file
/// `/d/f.ext` gets `/d/.f.ext`; a directory `/d` gets `/d/.assets`.
pub fn asset_path_for(owner_path: &str, owner_kind: NodeKind) -> String {
	let parent = crate::path::dirname(owner_path);
	let name = crate::path::basename(owner_path);
	match owner_kind {
		NodeKind::File => crate::path::join(&parent, &format!(".{}", name)).unwrap_or_else(|_| format!(".{}", name)),
		NodeKind::Directory => crate::path::join(owner_path, ".assets").unwrap_or_else(|_| ".assets".to_string()),
	}
}

pub struct AssetSubsystem<'k> {
	kernel: &'k Kernel,
}

impl<'k> AssetSubsystem<'k> {
	pub fn new(kernel: &'k Kernel) -> Self {
		AssetSubsystem { kernel }
	}

	/// §4.j `createAssetDirectory`: refuse if the computed path is already
	/// occupied, create the directory, and write the bidirectional pointers.
	pub fn create_asset_directory(&self, owner_path: &str, now_ms: u64) -> Result<NodeId, SyncError> {
		let owner = self.kernel.get_node_by_path(owner_path)?;
		let asset_path = asset_path_for(owner_path, owner.kind);
		if self.kernel.exists(&asset_path)? {
			return Err(SyncError::Asset(AssetError::PathOccupied { path: asset_path }));
		}
		let asset_dir = self.kernel.create_node(&asset_path, NodeKind::Directory, now_ms)?;

		self.kernel.set_metadata(
			owner.id,
			std::collections::BTreeMap::from([(ASSET_DIR_ID_KEY.to_string(), asset_dir.id.to_string())]),
			now_ms,
		)?;
		self.kernel.set_metadata(
			asset_dir.id,
			std::collections::BTreeMap::from([
				(OWNER_ID_KEY.to_string(), owner.id.to_string()),
				(IS_ASSET_DIR_KEY.to_string(), "true".to_string()),
			]),
			now_ms,
		)?;
		Ok(asset_dir.id)
	}

	/// §4.j: when an owner moves, recompute and move its asset directory.
	/// Called after `kernel.move_node` has already relocated the owner, so
	/// the asset directory is found via the owner's surviving `assetDirId`
	/// metadata (back-pointers travel with the node across a move) rather
	/// than by re-deriving a path that no longer exists.
	pub fn on_node_moved(&self, _old_owner_path: &str, new_owner_path: &str, now_ms: u64) -> Result<(), SyncError> {
		let new_owner = self.kernel.get_node_by_path(new_owner_path)?;
		let Some(asset_dir_id) = new_owner.metadata.get(ASSET_DIR_ID_KEY) else { return Ok(()) };
		let asset_dir_id: NodeId = asset_dir_id
			.parse()
			.map_err(|_| SyncError::Other { message: format!("invalid assetDirId on node {}", new_owner.id) })?;
		let old_asset_path = self.kernel.path_for(asset_dir_id)?;
		let new_asset_path = asset_path_for(new_owner_path, new_owner.kind);
		if old_asset_path != new_asset_path {
			self.kernel.move_node(&old_asset_path, &new_asset_path, now_ms)?;
		}
		Ok(())
	}

	/// §4.j: deep-copy the source's asset directory to the target's new
	/// asset path; the source keeps its back-reference, the target gets a
	/// fresh `assetDirId`.
	pub fn on_node_copied(
		&self,
		source_owner_path: &str,
		target_owner_path: &str,
		now_ms: u64,
	) -> Result<(), SyncError> {
		let Some(source_asset_path) = self.owner_asset_path(source_owner_path)? else { return Ok(()) };
		let target_owner = self.kernel.get_node_by_path(target_owner_path)?;
		let target_asset_path = asset_path_for(target_owner_path, target_owner.kind);
		let new_asset_dir_id = self.create_asset_directory(target_owner_path, now_ms)?;
		let _ = new_asset_dir_id;

		for child in self.kernel.readdir(&source_asset_path)? {
			if child.kind == NodeKind::File {
				let target_child_path = crate::path::join(&target_asset_path, &child.name)?;
				self.kernel.copy_node(
					&crate::path::join(&source_asset_path, &child.name)?,
					&target_child_path,
					now_ms,
				)?;
			}
		}
		Ok(())
	}

	fn owner_asset_path(&self, owner_path: &str) -> Result<Option<String>, SyncError> {
		let owner = match self.kernel.get_node_by_path(owner_path) {
			Ok(node) => node,
			Err(_) => return Ok(None),
		};
		match owner.metadata.get(ASSET_DIR_ID_KEY) {
			Some(id_str) => {
				let id: NodeId = id_str.parse().map_err(|_| SyncError::Other {
					message: format!("invalid assetDirId on node {}", owner.id),
				})?;
				match self.kernel.get_node(id) {
					Ok(_) => Ok(Some(asset_path_for(owner_path, owner.kind))),
					Err(_) => Ok(None),
				}
			}
			None => Ok(None),
		}
	}

	/// §4.j `collectAssetNodes`: every descendant of every asset directory
	/// owned by `node`'s descendants (including `node` itself), deduplicated.
	/// Callers union this with the normal descendant set for cascade delete.
	pub fn collect_asset_nodes(&self, owner_path: &str) -> Result<BTreeSet<NodeId>, SyncError> {
		let mut out = BTreeSet::new();
		self.collect_recursive(owner_path, &mut out)?;
		Ok(out)
	}

	fn collect_recursive(&self, path: &str, out: &mut BTreeSet<NodeId>) -> Result<(), SyncError> {
		if let Some(asset_path) = self.owner_asset_path(path)? {
			self.collect_all_descendants(&asset_path, out)?;
		}
		let node = self.kernel.get_node_by_path(path)?;
		if node.kind == NodeKind::Directory {
			for child in self.kernel.readdir(path)? {
				let child_path = crate::path::join(path, &child.name)?;
				self.collect_recursive(&child_path, out)?;
			}
		}
		Ok(())
	}

	fn collect_all_descendants(&self, path: &str, out: &mut BTreeSet<NodeId>) -> Result<(), SyncError> {
		let node = self.kernel.get_node_by_path(path)?;
		out.insert(node.id);
		if node.kind == NodeKind::Directory {
			for child in self.kernel.readdir(path)? {
				let child_path = crate::path::join(path, &child.name)?;
				self.collect_all_descendants(&child_path, out)?;
			}
		}
		Ok(())
	}
}


// vim: ts=4
