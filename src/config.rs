//! Configuration types and constants for vfsync
//!
//! Grounded on the teacher's config.rs (bare constants + small structs with
//! a `validate()`), extended to cover kernel and sync-engine tuning plus a
//! `toml`-backed file format the way `main.rs`/`config.rs` layer CLI flags
//! over a config file in the teacher.

use crate::sync::conflict::ConflictPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Inline-vs-chunked threshold for the packet builder (§4.l): file bodies at
/// or below this size are base64-inlined; larger bodies are chunk-referenced.
pub const DEFAULT_INLINE_THRESHOLD: u64 = 5 * 1024 * 1024;

/// Fixed chunk size for the chunk manager (§4.m).
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

/// Sync scheduler defaults (§4.o).
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_WAIT_TIME: Duration = Duration::from_secs(10);
pub const DEFAULT_MIN_SYNC_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_PENDING_COUNT: usize = 200;

/// Transport adapter defaults (§4.q).
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 8;

/// Well-known name for the reserved sync-state module (§3, §6.2).
pub const SYNC_MODULE_NAME: &str = "__sync__";

/// Well-known path for the module registry (§6.2).
pub const MODULE_REGISTRY_PATH: &str = "/__vfs_meta__/modules.json";

/// Internal metadata keys never transmitted over sync (§6.2).
pub const INTERNAL_METADATA_KEYS: &[&str] = &[
	"_sync_v",
	"_sync_vc",
	"_sync_time",
	"_sync_origin",
	"_sync_auto_created",
	"_sync_pending",
	"_local_only",
];

/// Tunable sync-engine configuration, the way the teacher's `ChunkConfig`
/// bundles chunking parameters with a `validate()` check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
	pub peer_id: String,
	pub inline_threshold: u64,
	pub chunk_size: usize,
	pub debounce_delay: Duration,
	pub max_wait_time: Duration,
	pub min_sync_interval: Duration,
	pub max_pending_count: usize,
	pub heartbeat_interval: Duration,
	pub request_timeout: Duration,
	pub max_reconnect_attempts: u32,
	/// Policy applied when vector clocks show a genuine concurrent change
	/// and no override in `conflict_overrides` matches the path (§4.n).
	pub default_conflict_policy: ConflictPolicy,
	/// Glob-pattern policy overrides evaluated first-match-wins before
	/// `default_conflict_policy`, e.g. `("*.generated", ServerWins)`.
	pub conflict_overrides: Vec<(String, ConflictPolicy)>,
}

impl Default for SyncConfig {
	fn default() -> Self {
		SyncConfig {
			peer_id: "local".to_string(),
			inline_threshold: DEFAULT_INLINE_THRESHOLD,
			chunk_size: DEFAULT_CHUNK_SIZE,
			debounce_delay: DEFAULT_DEBOUNCE_DELAY,
			max_wait_time: DEFAULT_MAX_WAIT_TIME,
			min_sync_interval: DEFAULT_MIN_SYNC_INTERVAL,
			max_pending_count: DEFAULT_MAX_PENDING_COUNT,
			heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
			default_conflict_policy: ConflictPolicy::NewerWins,
			conflict_overrides: Vec::new(),
		}
	}
}

impl SyncConfig {
	/// Validate the configuration, mirroring `ChunkConfig::validate` in the
	/// teacher.
	pub fn validate(&self) -> Result<(), String> {
		if self.peer_id.is_empty() {
			return Err("peer_id must not be empty".to_string());
		}
		if self.chunk_size == 0 {
			return Err("chunk_size must be > 0".to_string());
		}
		if self.max_pending_count == 0 {
			return Err("max_pending_count must be > 0".to_string());
		}
		if self.min_sync_interval > self.max_wait_time {
			return Err("min_sync_interval must not exceed max_wait_time".to_string());
		}
		crate::sync::conflict_rules::ConflictRuleSet::from_overrides(
			self.default_conflict_policy,
			&self.conflict_overrides,
		)?;
		Ok(())
	}

	/// Load configuration from a TOML file, falling back to defaults if the
	/// file does not exist (same layering as the teacher's config loader).
	pub fn load_from_file(path: &std::path::Path) -> Result<Self, String> {
		if !path.exists() {
			return Ok(Self::default());
		}
		let contents =
			std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
		let config: Self =
			toml::from_str(&contents).map_err(|e| format!("failed to parse config: {}", e))?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_config_valid() {
		assert!(SyncConfig::default().validate().is_ok());
	}

	#[test]
	fn test_empty_peer_id_invalid() {
		let config = SyncConfig { peer_id: String::new(), ..SyncConfig::default() };
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_zero_chunk_size_invalid() {
		let config = SyncConfig { chunk_size: 0, ..SyncConfig::default() };
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_load_missing_file_uses_defaults() {
		let config =
			SyncConfig::load_from_file(std::path::Path::new("/nonexistent/vfsync.toml")).unwrap();
		assert_eq!(config.peer_id, "local");
	}

	#[test]
	fn test_roundtrip_toml() {
		let config = SyncConfig::default();
		let toml_str = toml::to_string(&config).unwrap();
		let parsed: SyncConfig = toml::from_str(&toml_str).unwrap();
		assert_eq!(parsed.peer_id, config.peer_id);
		assert_eq!(parsed.chunk_size, config.chunk_size);
	}
}

// vim: ts=4
