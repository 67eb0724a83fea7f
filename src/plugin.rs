//! Plugin host (§4.g)
//!
//! Grounded on the teacher's `protocol` trait family (`async-trait`, a
//! phased lifecycle driven from one orchestrator) generalized from
//! protocol-version negotiation to plugin install/activate/deactivate.
//! Install ordering follows the spec: schemas are collected from every
//! plugin before any plugin is registered, then `activate_all` topologically
//! sorts on `dependencies`, failing the whole startup on a cycle.

use crate::error::{PluginError, SyncError};
use crate::event_bus::EventBus;
use crate::kernel::Kernel;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginKind {
	Storage,
	Middleware,
	Feature,
	Adapter,
}

#[derive(Debug, Clone)]
pub struct PluginMetadata {
	pub id: String,
	pub name: String,
	pub version: String,
	pub kind: PluginKind,
	pub dependencies: Vec<String>,
}

/// A named key-value collection a plugin wants the storage layer to carry.
/// Collected before storage connects (§4.g); our in-memory/redb adapters are
/// schema-less so this is informational only, kept for interface fidelity.
#[derive(Debug, Clone)]
pub struct CollectionSchema {
	pub name: String,
}

/// Handle passed to a plugin at install time.
pub struct PluginContext {
	pub kernel: Arc<Kernel>,
	pub events: EventBus,
}

#[async_trait]
pub trait Plugin: Send + Sync {
	fn metadata(&self) -> PluginMetadata;

	fn get_schemas(&self) -> Vec<CollectionSchema> {
		Vec::new()
	}

	async fn install(&mut self, ctx: &PluginContext) -> Result<(), SyncError>;
	async fn activate(&mut self) -> Result<(), SyncError>;
	async fn deactivate(&mut self) -> Result<(), SyncError>;
	async fn uninstall(&mut self) -> Result<(), SyncError>;
}

enum PluginState {
	Installed,
	Active,
	Inactive,
}

struct Registered {
	plugin: Box<dyn Plugin>,
	metadata: PluginMetadata,
	state: PluginState,
}

/// Drives plugin install ordering and dependency-aware activation.
pub struct PluginHost {
	ctx: PluginContext,
	plugins: BTreeMap<String, Registered>,
}

impl PluginHost {
	pub fn new(kernel: Arc<Kernel>, events: EventBus) -> Self {
		PluginHost { ctx: PluginContext { kernel, events }, plugins: BTreeMap::new() }
	}

	/// Collect schemas from every plugin, then install each in turn (§4.g:
	/// "factory step collects schemas ... merges ... registers ... only then
	/// opens storage"; storage is already open by the time a `Kernel` exists
	/// in this crate, so this method's ordering guarantee is schema
	/// collection happening before any plugin's `install` runs).
	pub async fn register_all(&mut self, mut plugins: Vec<Box<dyn Plugin>>) -> Result<(), SyncError> {
		let mut schemas = Vec::new();
		for p in &plugins {
			schemas.extend(p.get_schemas());
		}
		crate::logging::debug!(collected = schemas.len(), "collected plugin schemas before install");

		for mut plugin in plugins.drain(..) {
			let metadata = plugin.metadata();
			plugin.install(&self.ctx).await.map_err(|e| {
				SyncError::Plugin(PluginError::LoadFailed {
					plugin_id: metadata.id.clone(),
					phase: "install".to_string(),
					message: e.to_string(),
				})
			})?;
			self.plugins.insert(metadata.id.clone(), Registered { plugin, metadata, state: PluginState::Installed });
		}
		Ok(())
	}

	/// Topologically sort by `dependencies` and activate each plugin,
	/// activating a plugin's own dependencies first. Fails the whole
	/// operation on a dependency cycle (§4.g).
	pub async fn activate_all(&mut self) -> Result<(), SyncError> {
		let order = self.topological_order()?;
		for id in order {
			self.activate_one(&id).await?;
		}
		Ok(())
	}

	async fn activate_one(&mut self, id: &str) -> Result<(), SyncError> {
		if matches!(self.plugins.get(id).map(|r| &r.state), Some(PluginState::Active)) {
			return Ok(());
		}
		let registered = self.plugins.get_mut(id).ok_or_else(|| {
			SyncError::Plugin(PluginError::NotFound { plugin_id: id.to_string() })
		})?;
		registered.plugin.activate().await.map_err(|e| {
			SyncError::Plugin(PluginError::LoadFailed {
				plugin_id: id.to_string(),
				phase: "activate".to_string(),
				message: e.to_string(),
			})
		})?;
		registered.state = PluginState::Active;
		Ok(())
	}

	fn topological_order(&self) -> Result<Vec<String>, SyncError> {
		let mut order = Vec::new();
		let mut visited: BTreeSet<String> = BTreeSet::new();
		let mut on_stack: Vec<String> = Vec::new();

		for id in self.plugins.keys() {
			self.visit(id, &mut visited, &mut on_stack, &mut order)?;
		}
		Ok(order)
	}

	fn visit(
		&self,
		id: &str,
		visited: &mut BTreeSet<String>,
		on_stack: &mut Vec<String>,
		order: &mut Vec<String>,
	) -> Result<(), SyncError> {
		if visited.contains(id) {
			return Ok(());
		}
		if on_stack.contains(&id.to_string()) {
			let mut path = on_stack.clone();
			path.push(id.to_string());
			return Err(SyncError::Plugin(PluginError::DependencyCycle { path }));
		}
		let registered = self.plugins.get(id).ok_or_else(|| {
			SyncError::Plugin(PluginError::NotFound { plugin_id: id.to_string() })
		})?;
		on_stack.push(id.to_string());
		for dep in &registered.metadata.dependencies {
			if !self.plugins.contains_key(dep) {
				return Err(SyncError::Plugin(PluginError::DependencyMissing {
					plugin_id: id.to_string(),
					dependency: dep.clone(),
				}));
			}
			self.visit(dep, visited, on_stack, order)?;
		}
		on_stack.pop();
		visited.insert(id.to_string());
		order.push(id.to_string());
		Ok(())
	}

	pub fn get_plugin(&self, id: &str) -> Option<&PluginMetadata> {
		self.plugins.get(id).map(|r| &r.metadata)
	}

	pub async fn deactivate_all(&mut self) -> Result<(), SyncError> {
		for registered in self.plugins.values_mut() {
			if matches!(registered.state, PluginState::Active) {
				registered.plugin.deactivate().await?;
				registered.state = PluginState::Inactive;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::kernel::MemoryContentStore;
	use crate::storage::memory::MemoryStorage;

	struct RecordingPlugin {
		id: &'static str,
		deps: Vec<String>,
		activated_order: Arc<std::sync::Mutex<Vec<String>>>,
	}

	#[async_trait]
	impl Plugin for RecordingPlugin {
		fn metadata(&self) -> PluginMetadata {
			PluginMetadata {
				id: self.id.to_string(),
				name: self.id.to_string(),
				version: "0.1.0".to_string(),
				kind: PluginKind::Feature,
				dependencies: self.deps.clone(),
			}
		}
		async fn install(&mut self, _ctx: &PluginContext) -> Result<(), SyncError> {
			Ok(())
		}
		async fn activate(&mut self) -> Result<(), SyncError> {
			self.activated_order.lock().unwrap().push(self.id.to_string());
			Ok(())
		}
		async fn deactivate(&mut self) -> Result<(), SyncError> {
			Ok(())
		}
		async fn uninstall(&mut self) -> Result<(), SyncError> {
			Ok(())
		}
	}

	fn new_host() -> PluginHost {
		let kernel = Arc::new(
			Kernel::initialize(Arc::new(MemoryStorage::new()), Arc::new(MemoryContentStore::new())).unwrap(),
		);
		PluginHost::new(kernel, EventBus::new())
	}

	#[tokio::test]
	async fn test_activate_all_respects_dependency_order() {
		let mut host = new_host();
		let order = Arc::new(std::sync::Mutex::new(Vec::new()));
		let plugins: Vec<Box<dyn Plugin>> = vec![
			Box::new(RecordingPlugin { id: "b", deps: vec!["a".to_string()], activated_order: Arc::clone(&order) }),
			Box::new(RecordingPlugin { id: "a", deps: vec![], activated_order: Arc::clone(&order) }),
		];
		host.register_all(plugins).await.unwrap();
		host.activate_all().await.unwrap();
		assert_eq!(*order.lock().unwrap(), vec!["a".to_string(), "b".to_string()]);
	}

	#[tokio::test]
	async fn test_activate_all_detects_cycle() {
		let mut host = new_host();
		let order = Arc::new(std::sync::Mutex::new(Vec::new()));
		let plugins: Vec<Box<dyn Plugin>> = vec![
			Box::new(RecordingPlugin { id: "a", deps: vec!["b".to_string()], activated_order: Arc::clone(&order) }),
			Box::new(RecordingPlugin { id: "b", deps: vec!["a".to_string()], activated_order: Arc::clone(&order) }),
		];
		host.register_all(plugins).await.unwrap();
		assert!(host.activate_all().await.is_err());
	}

	#[tokio::test]
	async fn test_dependency_missing_is_reported() {
		let mut host = new_host();
		let order = Arc::new(std::sync::Mutex::new(Vec::new()));
		let plugins: Vec<Box<dyn Plugin>> =
			vec![Box::new(RecordingPlugin { id: "a", deps: vec!["ghost".to_string()], activated_order: order })];
		host.register_all(plugins).await.unwrap();
		assert!(host.activate_all().await.is_err());
	}
}

// vim: ts=4
