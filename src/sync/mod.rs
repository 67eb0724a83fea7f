//! Incremental sync engine (§4.k–§4.r)
//!
//! Supersedes the teacher's top-level `sync.rs`/`sync_impl/` (an n-way
//! filesystem walker) with the log/vector-clock/conflict/chunk/transport
//! pipeline §4 describes. Each submodule is grounded on a specific teacher
//! file or pattern; see its own doc comment and DESIGN.md.

pub mod chunker;
pub mod conflict;
pub mod conflict_rules;
pub mod executor;
pub mod file_transport;
pub mod log;
pub mod packet;
pub mod scheduler;
pub mod state_storage;
pub mod transport;
pub mod vector_clock;
