//! # vfsync - transactional virtual filesystem with an incremental sync engine
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vfsync::kernel::{Kernel, NodeKind};
//! use vfsync::storage::memory::MemoryStorage;
//! use vfsync::kernel::MemoryContentStore;
//! use std::sync::Arc;
//!
//! let kernel = Kernel::initialize(Arc::new(MemoryStorage::new()), Arc::new(MemoryContentStore::new()))?;
//! kernel.write("/docs/readme.txt", b"hello", 0)?;
//! # Ok::<(), vfsync::error::SyncError>(())
//! ```

#![warn(dead_code)]

pub mod assets;
pub mod config;
pub mod error;
pub mod event_bus;
pub mod ids;
pub mod kernel;
pub mod logging;
pub mod modules;
pub mod path;
pub mod peer_label;
pub mod plugin;
pub mod provider;
pub mod storage;
pub mod sync;
pub mod tags;

pub use error::SyncError;

// vim: ts=4
