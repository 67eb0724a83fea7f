//! Virtual path utilities
//!
//! VFS paths are `/`-separated strings rooted at `/`, independent of the
//! host filesystem's path conventions. Grounded on the teacher's
//! `validation/path.rs` (component-based safety checks), adapted from
//! `std::path::Path` components to plain string splitting since a vnode
//! path is a virtual key, not a filesystem path.

use crate::error::{KernelError, SyncError};

/// Normalize a virtual path: collapse repeated slashes, resolve `.` and `..`
/// segments, and ensure a single leading slash with no trailing slash
/// (except for the root itself).
pub fn normalize(path: &str) -> Result<String, SyncError> {
	let mut segments: Vec<&str> = Vec::new();
	for part in path.split('/') {
		match part {
			"" | "." => continue,
			".." => {
				if segments.pop().is_none() {
					return Err(SyncError::Kernel(KernelError::InvalidPath {
						path: path.to_string(),
						reason: "path escapes root".to_string(),
					}));
				}
			}
			seg => segments.push(seg),
		}
	}
	if segments.is_empty() {
		Ok("/".to_string())
	} else {
		Ok(format!("/{}", segments.join("/")))
	}
}

/// Check whether a path is a syntactically valid, already-normalized virtual
/// path (starts with `/`, no empty segments, no `.`/`..` segments).
pub fn is_valid(path: &str) -> bool {
	if path == "/" {
		return true;
	}
	if !path.starts_with('/') || path.ends_with('/') {
		return false;
	}
	path.split('/').skip(1).all(|seg| !seg.is_empty() && seg != "." && seg != "..")
}

/// The final path segment, or `/` for the root.
pub fn basename(path: &str) -> &str {
	if path == "/" {
		return "/";
	}
	path.rsplit('/').next().unwrap_or("")
}

/// The parent path, or `/` for the root and for top-level entries.
pub fn dirname(path: &str) -> String {
	if path == "/" {
		return "/".to_string();
	}
	match path.rfind('/') {
		Some(0) => "/".to_string(),
		Some(idx) => path[..idx].to_string(),
		None => "/".to_string(),
	}
}

/// Join a base path and a child segment into a normalized virtual path.
pub fn join(base: &str, child: &str) -> Result<String, SyncError> {
	let combined = if base == "/" { format!("/{}", child) } else { format!("{}/{}", base, child) };
	normalize(&combined)
}

/// The path of `path` relative to `root`, without a leading slash.
/// Returns `None` if `path` is not under `root`.
pub fn relative<'a>(root: &str, path: &'a str) -> Option<&'a str> {
	if !is_sub_path(root, path) {
		return None;
	}
	if root == "/" {
		return Some(path.trim_start_matches('/'));
	}
	Some(path[root.len()..].trim_start_matches('/'))
}

/// Whether `path` is `root` itself or nested beneath it.
pub fn is_sub_path(root: &str, path: &str) -> bool {
	if path == root {
		return true;
	}
	if root == "/" {
		return true;
	}
	path.starts_with(root) && path.as_bytes().get(root.len()) == Some(&b'/')
}

/// Number of segments from the root (root itself is depth 0).
pub fn depth(path: &str) -> usize {
	if path == "/" {
		return 0;
	}
	path.split('/').filter(|s| !s.is_empty()).count()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_normalize_collapses_slashes_and_dots() {
		assert_eq!(normalize("//a//b/./c/").unwrap(), "/a/b/c");
		assert_eq!(normalize("/").unwrap(), "/");
		assert_eq!(normalize("").unwrap(), "/");
	}

	#[test]
	fn test_normalize_resolves_parent_segments() {
		assert_eq!(normalize("/a/b/../c").unwrap(), "/a/c");
	}

	#[test]
	fn test_normalize_rejects_escaping_root() {
		assert!(normalize("/..").is_err());
		assert!(normalize("/a/../../b").is_err());
	}

	#[test]
	fn test_is_valid() {
		assert!(is_valid("/"));
		assert!(is_valid("/a/b"));
		assert!(!is_valid("a/b"));
		assert!(!is_valid("/a/"));
		assert!(!is_valid("/a/../b"));
	}

	#[test]
	fn test_basename_and_dirname() {
		assert_eq!(basename("/a/b/c"), "c");
		assert_eq!(basename("/"), "/");
		assert_eq!(dirname("/a/b/c"), "/a/b");
		assert_eq!(dirname("/a"), "/");
		assert_eq!(dirname("/"), "/");
	}

	#[test]
	fn test_join() {
		assert_eq!(join("/a", "b").unwrap(), "/a/b");
		assert_eq!(join("/", "b").unwrap(), "/b");
	}

	#[test]
	fn test_relative_and_sub_path() {
		assert!(is_sub_path("/a", "/a/b"));
		assert!(is_sub_path("/a", "/a"));
		assert!(!is_sub_path("/a", "/ab"));
		assert_eq!(relative("/a", "/a/b/c"), Some("b/c"));
		assert_eq!(relative("/a", "/b"), None);
	}

	#[test]
	fn test_depth() {
		assert_eq!(depth("/"), 0);
		assert_eq!(depth("/a"), 1);
		assert_eq!(depth("/a/b/c"), 3);
	}
}

// vim: ts=4
