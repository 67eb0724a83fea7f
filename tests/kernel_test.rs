//! Integration tests for the VFS kernel's public surface: directories,
//! files, moves, copies, and metadata, driven through `Kernel` only (no
//! internal access), against the in-memory storage adapter.

use std::sync::Arc;
use vfsync::kernel::{Kernel, MemoryContentStore, NodeKind};
use vfsync::storage::memory::MemoryStorage;

fn new_kernel() -> Kernel {
	Kernel::initialize(Arc::new(MemoryStorage::new()), Arc::new(MemoryContentStore::new())).unwrap()
}

#[test]
fn test_directory_tree_round_trip() {
	let kernel = new_kernel();
	kernel.ensure_directory("/docs/reports", 1).unwrap();
	kernel.write("/docs/reports/q1.txt", b"quarter one", 2).unwrap();
	kernel.write("/docs/readme.txt", b"hello", 2).unwrap();

	let top = kernel.readdir("/docs").unwrap();
	let mut names: Vec<_> = top.iter().map(|n| n.name.clone()).collect();
	names.sort();
	assert_eq!(names, vec!["readme.txt", "reports"]);

	assert_eq!(kernel.read("/docs/reports/q1.txt").unwrap(), b"quarter one");
}

#[test]
fn test_move_preserves_content_and_updates_listing() {
	let kernel = new_kernel();
	kernel.write("/a.txt", b"payload", 1).unwrap();
	kernel.move_node("/a.txt", "/b.txt", 2).unwrap();

	assert!(!kernel.exists("/a.txt").unwrap());
	assert_eq!(kernel.read("/b.txt").unwrap(), b"payload");
}

#[test]
fn test_move_directory_relocates_children() {
	let kernel = new_kernel();
	kernel.ensure_directory("/src", 1).unwrap();
	kernel.write("/src/main.rs", b"fn main() {}", 1).unwrap();
	kernel.move_node("/src", "/lib", 2).unwrap();

	assert!(!kernel.exists("/src").unwrap());
	assert_eq!(kernel.read("/lib/main.rs").unwrap(), b"fn main() {}");
}

#[test]
fn test_copy_node_duplicates_content_independently() {
	let kernel = new_kernel();
	kernel.write("/orig.txt", b"v1", 1).unwrap();
	kernel.copy_node("/orig.txt", "/copy.txt", 2).unwrap();
	kernel.write("/orig.txt", b"v2", 3).unwrap();

	assert_eq!(kernel.read("/orig.txt").unwrap(), b"v2");
	assert_eq!(kernel.read("/copy.txt").unwrap(), b"v1");
}

#[test]
fn test_unlink_removes_file() {
	let kernel = new_kernel();
	kernel.write("/gone.txt", b"bye", 1).unwrap();
	kernel.unlink("/gone.txt", false).unwrap();
	assert!(!kernel.exists("/gone.txt").unwrap());
}

#[test]
fn test_set_metadata_merges_without_clobbering() {
	let kernel = new_kernel();
	let node = kernel.write("/tagged.txt", b"x", 1).unwrap();

	let mut first = std::collections::BTreeMap::new();
	first.insert("owner".to_string(), "alice".to_string());
	kernel.set_metadata(node.id, first, 2).unwrap();

	let mut second = std::collections::BTreeMap::new();
	second.insert("reviewed".to_string(), "true".to_string());
	let updated = kernel.set_metadata(node.id, second, 3).unwrap();

	assert_eq!(updated.metadata.get("owner").map(String::as_str), Some("alice"));
	assert_eq!(updated.metadata.get("reviewed").map(String::as_str), Some("true"));
}

#[test]
fn test_read_missing_path_errors() {
	let kernel = new_kernel();
	assert!(kernel.read("/nope.txt").is_err());
}

#[test]
fn test_root_exists_and_is_directory() {
	let kernel = new_kernel();
	assert!(kernel.exists("/").unwrap());
	assert_eq!(kernel.get_node_by_path("/").unwrap().kind, NodeKind::Directory);
}
