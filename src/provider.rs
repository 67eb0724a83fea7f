//! Content-provider pipeline (§4.h)
//!
//! Grounded on the teacher's `protocol::traits::SyncProtocol` (one
//! `async-trait` with a phased contract driven by a single orchestrator),
//! generalized to a priority-sorted registry of hook sets folded over a
//! write/delete/move/copy/read. A composite provider (e.g. "markdown") is
//! itself a `ContentProvider` whose hooks fan out to inner providers.

use crate::error::{ProviderError, SyncError};
use crate::kernel::VNode;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Hook set a provider may implement. Default no-ops mean a provider only
/// needs to override what it actually cares about.
#[async_trait]
pub trait ContentProvider: Send + Sync {
	fn name(&self) -> &str;
	fn priority(&self) -> i32;

	/// Whether this provider applies to `node` at all. Default: always.
	fn can_handle(&self, _node: &VNode) -> bool {
		true
	}

	async fn on_validate(&self, _node: &VNode, _content: &[u8]) -> Result<(), SyncError> {
		Ok(())
	}

	async fn on_before_write(&self, _node: &VNode, content: Vec<u8>) -> Result<Vec<u8>, SyncError> {
		Ok(content)
	}

	async fn on_after_write(
		&self,
		_node: &VNode,
		_content: &[u8],
	) -> Result<BTreeMap<String, String>, SyncError> {
		Ok(BTreeMap::new())
	}

	async fn on_before_delete(&self, _node: &VNode) -> Result<(), SyncError> {
		Ok(())
	}

	async fn on_after_delete(&self, _node: &VNode) -> Result<(), SyncError> {
		Ok(())
	}

	async fn on_after_move(&self, _node: &VNode, _old_path: &str) -> Result<(), SyncError> {
		Ok(())
	}

	async fn on_after_copy(&self, _node: &VNode, _source: &VNode) -> Result<(), SyncError> {
		Ok(())
	}

	async fn on_after_read(&self, _node: &VNode, content: Vec<u8>) -> Result<Vec<u8>, SyncError> {
		Ok(content)
	}
}

/// Keeps providers sorted by descending priority and folds their hooks over
/// an operation (§4.h).
#[derive(Default)]
pub struct ProviderRegistry {
	providers: Vec<Box<dyn ContentProvider>>,
}

impl ProviderRegistry {
	pub fn new() -> Self {
		ProviderRegistry::default()
	}

	pub fn register(&mut self, provider: Box<dyn ContentProvider>) {
		self.providers.push(provider);
		self.providers.sort_by_key(|p| std::cmp::Reverse(p.priority()));
	}

	fn applicable<'a>(&'a self, node: &'a VNode) -> impl Iterator<Item = &'a Box<dyn ContentProvider>> + 'a {
		self.providers.iter().filter(move |p| p.can_handle(node))
	}

	/// Run the write pipeline: validate (all-or-nothing) -> fold
	/// before-write -> (caller persists) -> fold after-write into derived
	/// data (§4.h steps 1-4).
	pub async fn before_write(&self, node: &VNode, content: &[u8]) -> Result<Vec<u8>, SyncError> {
		for provider in self.applicable(node) {
			provider.on_validate(node, content).await.map_err(|e| {
				SyncError::Provider(ProviderError::ValidationFailed {
					provider: provider.name().to_string(),
					message: e.to_string(),
				})
			})?;
		}
		let mut rewritten = content.to_vec();
		for provider in self.applicable(node) {
			rewritten = provider.on_before_write(node, rewritten).await.map_err(|e| {
				SyncError::Provider(ProviderError::HookFailed {
					provider: provider.name().to_string(),
					hook: "onBeforeWrite".to_string(),
					message: e.to_string(),
				})
			})?;
		}
		Ok(rewritten)
	}

	pub async fn after_write(
		&self,
		node: &VNode,
		content: &[u8],
	) -> Result<BTreeMap<String, String>, SyncError> {
		let mut derived = BTreeMap::new();
		for provider in self.applicable(node) {
			let out = provider.on_after_write(node, content).await.map_err(|e| {
				SyncError::Provider(ProviderError::HookFailed {
					provider: provider.name().to_string(),
					hook: "onAfterWrite".to_string(),
					message: e.to_string(),
				})
			})?;
			derived.extend(out);
		}
		Ok(derived)
	}

	pub async fn before_delete(&self, node: &VNode) -> Result<(), SyncError> {
		for provider in self.applicable(node) {
			provider.on_before_delete(node).await?;
		}
		Ok(())
	}

	pub async fn after_delete(&self, node: &VNode) -> Result<(), SyncError> {
		for provider in self.applicable(node) {
			provider.on_after_delete(node).await?;
		}
		Ok(())
	}

	pub async fn after_move(&self, node: &VNode, old_path: &str) -> Result<(), SyncError> {
		for provider in self.applicable(node) {
			provider.on_after_move(node, old_path).await?;
		}
		Ok(())
	}

	pub async fn after_copy(&self, node: &VNode, source: &VNode) -> Result<(), SyncError> {
		for provider in self.applicable(node) {
			provider.on_after_copy(node, source).await?;
		}
		Ok(())
	}

	pub async fn after_read(&self, node: &VNode, content: Vec<u8>) -> Result<Vec<u8>, SyncError> {
		let mut out = content;
		for provider in self.applicable(node) {
			out = provider.on_after_read(node, out).await?;
		}
		Ok(out)
	}
}

/// A composite provider whose hooks fan out into inner providers, e.g. a
/// "markdown" provider wrapping a frontmatter provider and a link-index
/// provider (§4.h).
pub struct CompositeProvider {
	name: String,
	priority: i32,
	inner: ProviderRegistry,
}

impl CompositeProvider {
	pub fn new(name: impl Into<String>, priority: i32) -> Self {
		CompositeProvider { name: name.into(), priority, inner: ProviderRegistry::new() }
	}

	pub fn add_inner(&mut self, provider: Box<dyn ContentProvider>) {
		self.inner.register(provider);
	}
}

#[async_trait]
impl ContentProvider for CompositeProvider {
	fn name(&self) -> &str {
		&self.name
	}

	fn priority(&self) -> i32 {
		self.priority
	}

	async fn on_validate(&self, node: &VNode, content: &[u8]) -> Result<(), SyncError> {
		for provider in self.inner.applicable(node) {
			provider.on_validate(node, content).await?;
		}
		Ok(())
	}

	async fn on_before_write(&self, node: &VNode, content: Vec<u8>) -> Result<Vec<u8>, SyncError> {
		self.inner.before_write(node, &content).await
	}

	async fn on_after_write(
		&self,
		node: &VNode,
		content: &[u8],
	) -> Result<BTreeMap<String, String>, SyncError> {
		self.inner.after_write(node, content).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::kernel::NodeKind;
	use std::sync::Arc;

	fn file_node() -> VNode {
		VNode {
			id: crate::ids::new_node_id(),
			parent: None,
			name: "f.txt".to_string(),
			kind: NodeKind::File,
			content_ref: None,
			size: 0,
			created_at: 0,
			updated_at: 0,
			metadata: BTreeMap::new(),
		}
	}

	struct UppercaseProvider;

	#[async_trait]
	impl ContentProvider for UppercaseProvider {
		fn name(&self) -> &str {
			"uppercase"
		}
		fn priority(&self) -> i32 {
			10
		}
		async fn on_before_write(&self, _node: &VNode, content: Vec<u8>) -> Result<Vec<u8>, SyncError> {
			Ok(content.to_ascii_uppercase())
		}
	}

	struct RejectingProvider;

	#[async_trait]
	impl ContentProvider for RejectingProvider {
		fn name(&self) -> &str {
			"rejecting"
		}
		fn priority(&self) -> i32 {
			0
		}
		async fn on_validate(&self, _node: &VNode, _content: &[u8]) -> Result<(), SyncError> {
			Err(SyncError::Other { message: "rejected".to_string() })
		}
	}

	#[tokio::test]
	async fn test_before_write_folds_rewrites() {
		let mut registry = ProviderRegistry::new();
		registry.register(Box::new(UppercaseProvider));
		let node = file_node();
		let out = registry.before_write(&node, b"hello").await.unwrap();
		assert_eq!(out, b"HELLO");
	}

	#[tokio::test]
	async fn test_validation_failure_aborts_before_mutation() {
		let mut registry = ProviderRegistry::new();
		registry.register(Box::new(RejectingProvider));
		registry.register(Box::new(UppercaseProvider));
		let node = file_node();
		assert!(registry.before_write(&node, b"hello").await.is_err());
	}

	#[tokio::test]
	async fn test_providers_run_in_descending_priority_order() {
		let order = Arc::new(std::sync::Mutex::new(Vec::new()));
		struct Tracking(&'static str, i32, Arc<std::sync::Mutex<Vec<&'static str>>>);
		#[async_trait]
		impl ContentProvider for Tracking {
			fn name(&self) -> &str {
				self.0
			}
			fn priority(&self) -> i32 {
				self.1
			}
			async fn on_before_write(&self, _node: &VNode, content: Vec<u8>) -> Result<Vec<u8>, SyncError> {
				self.2.lock().unwrap().push(self.0);
				Ok(content)
			}
		}
		let mut registry = ProviderRegistry::new();
		registry.register(Box::new(Tracking("low", 1, Arc::clone(&order))));
		registry.register(Box::new(Tracking("high", 10, Arc::clone(&order))));
		let node = file_node();
		registry.before_write(&node, b"x").await.unwrap();
		assert_eq!(*order.lock().unwrap(), vec!["high", "low"]);
	}
}

// vim: ts=4
