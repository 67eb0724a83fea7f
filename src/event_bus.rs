//! Typed event bus with wildcard subscription
//!
//! Grounded on the teacher's `callbacks.rs`: boxed `Fn` trait objects behind
//! `Send + Sync` type aliases, the same shape as `ProgressFn`/`ConflictFn`.
//! Where the teacher hands out one fixed trait per callback kind, §2.d asks
//! for a general pub/sub bus keyed by event kind with wildcard ("*")
//! subscription and tolerance for handlers that re-enter the bus (publishing
//! from inside a handler), so subscriptions are snapshotted before dispatch.

use crate::ids::NodeId;
use std::sync::{Arc, Mutex};

/// Kernel- and sync-level events emitted on transaction commit (§2.d, §4.e).
#[derive(Debug, Clone)]
pub enum Event {
	NodeCreated { node_id: NodeId, path: String },
	NodeUpdated { node_id: NodeId, path: String },
	NodeDeleted { node_id: NodeId, path: String },
	NodeMoved { node_id: NodeId, from_path: String, to_path: String },
	NodeCopied { node_id: NodeId, new_node_id: NodeId, from_path: String, to_path: String },
	TagAdded { node_id: NodeId, tag: String },
	TagRemoved { node_id: NodeId, tag: String },
	ModuleMounted { name: String },
	ModuleUnmounted { name: String },
	ConflictDetected { node_id: NodeId },
	ConflictResolved { node_id: NodeId },
}

impl Event {
	/// The event kind string used for subscription matching, e.g.
	/// `"node.created"`.
	pub fn kind(&self) -> &'static str {
		match self {
			Event::NodeCreated { .. } => "node.created",
			Event::NodeUpdated { .. } => "node.updated",
			Event::NodeDeleted { .. } => "node.deleted",
			Event::NodeMoved { .. } => "node.moved",
			Event::NodeCopied { .. } => "node.copied",
			Event::TagAdded { .. } => "tag.added",
			Event::TagRemoved { .. } => "tag.removed",
			Event::ModuleMounted { .. } => "module.mounted",
			Event::ModuleUnmounted { .. } => "module.unmounted",
			Event::ConflictDetected { .. } => "conflict.detected",
			Event::ConflictResolved { .. } => "conflict.resolved",
		}
	}
}

type Handler = dyn Fn(&Event) + Send + Sync;

struct Subscription {
	pattern: String,
	handler: Arc<Handler>,
}

/// A pub/sub bus. Subscriptions may use `"*"` to receive every event, or an
/// exact kind string (see `Event::kind`) to receive only that kind.
#[derive(Clone, Default)]
pub struct EventBus {
	subscriptions: Arc<Mutex<Vec<Subscription>>>,
}

impl EventBus {
	pub fn new() -> Self {
		EventBus { subscriptions: Arc::new(Mutex::new(Vec::new())) }
	}

	/// Subscribe `handler` to events whose kind matches `pattern` (`"*"` for
	/// all kinds).
	pub fn subscribe<F>(&self, pattern: &str, handler: F)
	where
		F: Fn(&Event) + Send + Sync + 'static,
	{
		let mut subs = self.subscriptions.lock().unwrap();
		subs.push(Subscription { pattern: pattern.to_string(), handler: Arc::new(handler) });
	}

	/// Publish an event to all matching subscribers.
	///
	/// The subscriber list is cloned out from under the lock before
	/// dispatch, so a handler that calls `subscribe`/`publish` again (e.g. a
	/// plugin reacting to `NODE_DELETED` by emitting a follow-up event) never
	/// deadlocks and never observes a half-updated subscriber list.
	pub fn publish(&self, event: Event) {
		let handlers: Vec<Arc<Handler>> = {
			let subs = self.subscriptions.lock().unwrap();
			subs.iter()
				.filter(|s| s.pattern == "*" || s.pattern == event.kind())
				.map(|s| Arc::clone(&s.handler))
				.collect()
		};
		for handler in handlers {
			handler(&event);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[test]
	fn test_exact_kind_subscription() {
		let bus = EventBus::new();
		let count = Arc::new(AtomicUsize::new(0));
		let c = Arc::clone(&count);
		bus.subscribe("node.created", move |_| {
			c.fetch_add(1, Ordering::SeqCst);
		});
		bus.publish(Event::NodeCreated { node_id: NodeId::new_v4(), path: "/a".to_string() });
		bus.publish(Event::NodeDeleted { node_id: NodeId::new_v4(), path: "/a".to_string() });
		assert_eq!(count.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn test_wildcard_subscription() {
		let bus = EventBus::new();
		let count = Arc::new(AtomicUsize::new(0));
		let c = Arc::clone(&count);
		bus.subscribe("*", move |_| {
			c.fetch_add(1, Ordering::SeqCst);
		});
		bus.publish(Event::NodeCreated { node_id: NodeId::new_v4(), path: "/a".to_string() });
		bus.publish(Event::NodeDeleted { node_id: NodeId::new_v4(), path: "/a".to_string() });
		assert_eq!(count.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn test_handler_can_subscribe_during_dispatch() {
		let bus = EventBus::new();
		let count = Arc::new(AtomicUsize::new(0));
		let bus_clone = bus.clone();
		let c = Arc::clone(&count);
		bus.subscribe("node.created", move |_| {
			let c2 = Arc::clone(&c);
			bus_clone.subscribe("node.deleted", move |_| {
				c2.fetch_add(1, Ordering::SeqCst);
			});
		});
		bus.publish(Event::NodeCreated { node_id: NodeId::new_v4(), path: "/a".to_string() });
		bus.publish(Event::NodeDeleted { node_id: NodeId::new_v4(), path: "/a".to_string() });
		assert_eq!(count.load(Ordering::SeqCst), 1);
	}
}

// vim: ts=4
