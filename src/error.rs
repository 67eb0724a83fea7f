//! Error types for vfsync operations
//!
//! Grounded on the teacher's error.rs: one top-level enum with direct
//! variants for common cases and nested domain enums for the rest, each with
//! a hand-rolled `Display` and a `From` impl into `SyncError`.

use std::error::Error;
use std::fmt;
use std::io;

/// Helper to reduce `Box::new()` boilerplate when wrapping errors.
#[inline]
pub fn boxed_error<E: Error + Send + Sync + 'static>(e: E) -> Box<dyn Error + Send + Sync> {
	Box::new(e)
}

/// Unified error type for the whole crate.
#[derive(Debug)]
pub enum SyncError {
	/// I/O error
	Io(io::Error),

	/// Invalid configuration
	InvalidConfig { message: String },

	/// Kernel error (nested)
	Kernel(KernelError),

	/// Plugin error (nested)
	Plugin(PluginError),

	/// Content-provider error (nested)
	Provider(ProviderError),

	/// Tag subsystem error (nested)
	Tag(TagError),

	/// Asset subsystem error (nested)
	Asset(AssetError),

	/// Chunking error (nested)
	Chunk(ChunkError),

	/// Conflict resolution error (nested)
	Conflict(ConflictError),

	/// Transport error (nested)
	Transport(TransportError),

	/// Storage adapter error (nested)
	Storage(Box<dyn Error + Send + Sync>),

	/// Generic error message
	Other { message: String },
}

impl fmt::Display for SyncError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SyncError::Io(e) => write!(f, "I/O error: {}", e),
			SyncError::InvalidConfig { message } => write!(f, "Invalid configuration: {}", message),
			SyncError::Kernel(e) => write!(f, "Kernel error: {}", e),
			SyncError::Plugin(e) => write!(f, "Plugin error: {}", e),
			SyncError::Provider(e) => write!(f, "Content provider error: {}", e),
			SyncError::Tag(e) => write!(f, "Tag error: {}", e),
			SyncError::Asset(e) => write!(f, "Asset error: {}", e),
			SyncError::Chunk(e) => write!(f, "Chunk error: {}", e),
			SyncError::Conflict(e) => write!(f, "Conflict error: {}", e),
			SyncError::Transport(e) => write!(f, "Transport error: {}", e),
			SyncError::Storage(e) => write!(f, "Storage error: {}", e),
			SyncError::Other { message } => write!(f, "{}", message),
		}
	}
}

impl Error for SyncError {}

impl From<io::Error> for SyncError {
	fn from(e: io::Error) -> Self {
		SyncError::Io(e)
	}
}

impl From<String> for SyncError {
	fn from(e: String) -> Self {
		SyncError::Other { message: e }
	}
}

impl From<Box<dyn Error + Send + Sync>> for SyncError {
	fn from(e: Box<dyn Error + Send + Sync>) -> Self {
		SyncError::Storage(e)
	}
}

macro_rules! nest_error {
	($variant:ident, $ty:ty) => {
		impl From<$ty> for SyncError {
			fn from(e: $ty) -> Self {
				SyncError::$variant(e)
			}
		}
	};
}

nest_error!(Kernel, KernelError);
nest_error!(Plugin, PluginError);
nest_error!(Provider, ProviderError);
nest_error!(Tag, TagError);
nest_error!(Asset, AssetError);
nest_error!(Chunk, ChunkError);
nest_error!(Conflict, ConflictError);
nest_error!(Transport, TransportError);

/// §7: NotFound, AlreadyExists, InvalidPath, InvalidOperation,
/// TransactionFailed/Aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
	NotFound { what: String },
	AlreadyExists { path: String },
	InvalidPath { path: String, reason: String },
	InvalidOperation { message: String },
	TransactionAborted { message: String },
}

impl fmt::Display for KernelError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			KernelError::NotFound { what } => write!(f, "not found: {}", what),
			KernelError::AlreadyExists { path } => write!(f, "already exists: {}", path),
			KernelError::InvalidPath { path, reason } => {
				write!(f, "invalid path {:?}: {}", path, reason)
			}
			KernelError::InvalidOperation { message } => write!(f, "invalid operation: {}", message),
			KernelError::TransactionAborted { message } => {
				write!(f, "transaction aborted: {}", message)
			}
		}
	}
}

impl Error for KernelError {}

/// §4.g, §7: PluginLoadError during install/activate/deactivate/uninstall,
/// plus dependency-cycle detection during `activate_all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
	LoadFailed { plugin_id: String, phase: String, message: String },
	DependencyCycle { path: Vec<String> },
	DependencyMissing { plugin_id: String, dependency: String },
	NotFound { plugin_id: String },
}

impl fmt::Display for PluginError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PluginError::LoadFailed { plugin_id, phase, message } => {
				write!(f, "plugin '{}' failed during {}: {}", plugin_id, phase, message)
			}
			PluginError::DependencyCycle { path } => {
				write!(f, "dependency cycle detected: {}", path.join(" -> "))
			}
			PluginError::DependencyMissing { plugin_id, dependency } => {
				write!(f, "plugin '{}' depends on unregistered plugin '{}'", plugin_id, dependency)
			}
			PluginError::NotFound { plugin_id } => write!(f, "plugin not found: {}", plugin_id),
		}
	}
}

impl Error for PluginError {}

/// §4.h: validate failures abort before any mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
	ValidationFailed { provider: String, message: String },
	HookFailed { provider: String, hook: String, message: String },
}

impl fmt::Display for ProviderError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ProviderError::ValidationFailed { provider, message } => {
				write!(f, "provider '{}' rejected write: {}", provider, message)
			}
			ProviderError::HookFailed { provider, hook, message } => {
				write!(f, "provider '{}' hook '{}' failed: {}", provider, hook, message)
			}
		}
	}
}

impl Error for ProviderError {}

/// §4.i
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
	ProtectedTag { name: String },
	NotFound { name: String },
}

impl fmt::Display for TagError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TagError::ProtectedTag { name } => write!(f, "tag '{}' is protected", name),
			TagError::NotFound { name } => write!(f, "tag not found: {}", name),
		}
	}
}

impl Error for TagError {}

/// §4.j
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
	PathOccupied { path: String },
	OwnerNotFound { owner_id: String },
}

impl fmt::Display for AssetError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AssetError::PathOccupied { path } => {
				write!(f, "asset directory path already occupied: {}", path)
			}
			AssetError::OwnerNotFound { owner_id } => {
				write!(f, "asset owner not found: {}", owner_id)
			}
		}
	}
}

impl Error for AssetError {}

/// §4.m: kept from the teacher's `ChunkError`, hash algorithm now SHA-256.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
	HashMismatch { expected: String, actual: String },
	MissingChunk { content_hash: String, index: u32 },
	InvalidConfig { message: String },
}

impl fmt::Display for ChunkError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ChunkError::HashMismatch { expected, actual } => {
				write!(f, "hash mismatch: expected {}, got {}", expected, actual)
			}
			ChunkError::MissingChunk { content_hash, index } => {
				write!(f, "missing chunk {} index {}", content_hash, index)
			}
			ChunkError::InvalidConfig { message } => write!(f, "invalid chunk config: {}", message),
		}
	}
}

impl Error for ChunkError {}

/// §4.n, §7
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictError {
	Unresolved { node_id: String },
	InvalidResolution { message: String },
}

impl fmt::Display for ConflictError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConflictError::Unresolved { node_id } => {
				write!(f, "conflict on node {} is unresolved", node_id)
			}
			ConflictError::InvalidResolution { message } => {
				write!(f, "invalid conflict resolution: {}", message)
			}
		}
	}
}

impl Error for ConflictError {}

/// §4.q, §7: carries `retryable` the way the spec requires for connection
/// and sync failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
	ConnectionFailed { message: String, retryable: bool },
	Timeout { request: String },
	ReconnectExhausted { attempts: u32 },
	ProtocolMismatch { message: String },
}

impl TransportError {
	pub fn retryable(&self) -> bool {
		match self {
			TransportError::ConnectionFailed { retryable, .. } => *retryable,
			TransportError::Timeout { .. } => true,
			TransportError::ReconnectExhausted { .. } => true,
			TransportError::ProtocolMismatch { .. } => false,
		}
	}
}

impl fmt::Display for TransportError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TransportError::ConnectionFailed { message, .. } => {
				write!(f, "connection failed: {}", message)
			}
			TransportError::Timeout { request } => write!(f, "request timed out: {}", request),
			TransportError::ReconnectExhausted { attempts } => {
				write!(f, "reconnect exhausted after {} attempts", attempts)
			}
			TransportError::ProtocolMismatch { message } => {
				write!(f, "protocol mismatch: {}", message)
			}
		}
	}
}

impl Error for TransportError {}

// vim: ts=4
