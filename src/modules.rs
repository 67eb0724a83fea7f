//! Module registry (§3 Module entity, §6.2 persisted state layout)
//!
//! A module is a named root subtree — `rootNodeId`, `isProtected`,
//! `syncEnabled`, timestamps, metadata. The registry itself is persisted as
//! a JSON document inside the kernel, at `config::MODULE_REGISTRY_PATH`, the
//! way the teacher's `state.rs` persists `StateManager` data as a JSON file
//! next to the content it describes rather than in a side channel.

use crate::config::MODULE_REGISTRY_PATH;
use crate::error::{PluginError, SyncError};
use crate::ids::NodeId;
use crate::kernel::{Kernel, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
	pub name: String,
	pub root_node_id: NodeId,
	pub is_protected: bool,
	pub sync_enabled: bool,
	pub created_at: u64,
	pub updated_at: u64,
	pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Registry {
	modules: BTreeMap<String, Module>,
}

/// Owns the module registry, persisted through the kernel so registration
/// gets the same transactional guarantees as any other write.
pub struct ModuleRegistry<'k> {
	kernel: &'k Kernel,
}

impl<'k> ModuleRegistry<'k> {
	pub fn new(kernel: &'k Kernel) -> Self {
		ModuleRegistry { kernel }
	}

	fn load(&self) -> Result<Registry, SyncError> {
		if !self.kernel.exists(MODULE_REGISTRY_PATH)? {
			return Ok(Registry::default());
		}
		let bytes = self.kernel.read(MODULE_REGISTRY_PATH)?;
		serde_json::from_slice(&bytes).map_err(crate::error::boxed_error).map_err(SyncError::from)
	}

	fn save(&self, registry: &Registry, now_ms: u64) -> Result<(), SyncError> {
		let bytes = serde_json::to_vec_pretty(registry).map_err(crate::error::boxed_error)?;
		let parent = crate::path::dirname(MODULE_REGISTRY_PATH);
		self.kernel.ensure_directory(&parent, now_ms)?;
		self.kernel.write(MODULE_REGISTRY_PATH, &bytes, now_ms)?;
		Ok(())
	}

	/// Mount a new module rooted at `root_path`, creating the root directory
	/// if it doesn't already exist.
	pub fn mount(
		&self,
		name: &str,
		root_path: &str,
		is_protected: bool,
		sync_enabled: bool,
		now_ms: u64,
	) -> Result<Module, SyncError> {
		let root = self.kernel.create_node_if_not_exists(root_path, NodeKind::Directory, now_ms)?;
		let module = Module {
			name: name.to_string(),
			root_node_id: root.id,
			is_protected,
			sync_enabled,
			created_at: now_ms,
			updated_at: now_ms,
			metadata: BTreeMap::new(),
		};
		let mut registry = self.load()?;
		registry.modules.insert(name.to_string(), module.clone());
		self.save(&registry, now_ms)?;
		Ok(module)
	}

	pub fn get(&self, name: &str) -> Result<Option<Module>, SyncError> {
		Ok(self.load()?.modules.get(name).cloned())
	}

	pub fn list(&self) -> Result<Vec<Module>, SyncError> {
		Ok(self.load()?.modules.into_values().collect())
	}

	/// Unmount a module. Protected modules (the reserved sync module, the
	/// internal metadata root) refuse unmount (§3).
	pub fn unmount(&self, name: &str, now_ms: u64) -> Result<(), SyncError> {
		let mut registry = self.load()?;
		match registry.modules.get(name) {
			None => return Err(SyncError::Plugin(PluginError::NotFound { plugin_id: name.to_string() })),
			Some(m) if m.is_protected => {
				return Err(SyncError::Kernel(crate::error::KernelError::InvalidOperation {
					message: format!("module '{}' is protected and cannot be unmounted", name),
				}));
			}
			_ => {}
		}
		registry.modules.remove(name);
		self.save(&registry, now_ms)
	}
}


// vim: ts=4
