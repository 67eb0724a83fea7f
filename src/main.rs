use clap::{Arg, ArgAction, Command};
use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use vfsync::kernel::{Kernel, NodeKind};
use vfsync::modules::ModuleRegistry;
use vfsync::peer_label::format_peer_label;
use vfsync::storage::blob::BlobStore;
use vfsync::storage::redb_store::RedbStorage;
use vfsync::sync::executor::SyncExecutor;
use vfsync::sync::file_transport::FileTransport;
use vfsync::sync::log::LogOp;
use vfsync::sync::state_storage::{self, SyncCursor};
use vfsync::sync::vector_clock::VectorClock;

fn now_ms() -> u64 {
	SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before epoch").as_millis() as u64
}

/// Resolve (and create, if missing) `~/.vfsync`, the way the teacher's
/// `init_syncr_dir` resolves `~/.syncr`.
fn init_vfsync_dir() -> PathBuf {
	let home = env::var("HOME").expect("could not determine HOME directory");
	let dir = PathBuf::from(home).join(".vfsync");
	if !dir.exists() {
		std::fs::create_dir_all(&dir).expect("failed to create ~/.vfsync");
	}
	dir
}

fn open_kernel(vfsync_dir: &std::path::Path) -> Result<Kernel, Box<dyn Error>> {
	let storage = Arc::new(RedbStorage::open(&vfsync_dir.join("graph.redb"))?);
	let content = Arc::new(BlobStore::open(&vfsync_dir.join("blobs.redb"))?);
	Ok(Kernel::initialize(storage, content)?)
}

/// Record a Create entry for every node under `path` so a one-shot CLI push
/// has something to send; the sync engine otherwise expects a long-lived
/// `SyncExecutor` fed incrementally by `record_local_change` as writes occur.
fn enqueue_tree(kernel: &Kernel, executor: &SyncExecutor, path: &str) -> Result<(), Box<dyn Error>> {
	let node = kernel.get_node_by_path(path)?;
	executor.record_local_change(node.id, LogOp::Create);
	if node.kind == NodeKind::Directory {
		for child in kernel.readdir(path)? {
			let child_path = vfsync::path::join(path, &child.name)?;
			enqueue_tree(kernel, executor, &child_path)?;
		}
	}
	Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
	vfsync::logging::init_tracing();

	let matches = Command::new("vfsync")
		.version("0.1.0")
		.about("Transactional virtual filesystem with an incremental sync engine")
		.subcommand_required(true)
		.arg(Arg::new("peer").short('p').long("peer").value_name("PEER_ID").help("Local peer id"))
		.subcommand(Command::new("init").about("Initialize the local vfsync store"))
		.subcommand(
			Command::new("mount")
				.about("Mount a module at a root path")
				.arg(Arg::new("name").required(true))
				.arg(Arg::new("path").required(true))
				.arg(Arg::new("protected").long("protected").action(ArgAction::SetTrue))
				.arg(Arg::new("no-sync").long("no-sync").action(ArgAction::SetTrue)),
		)
		.subcommand(
			Command::new("write")
				.about("Write content to a virtual path")
				.arg(Arg::new("path").required(true))
				.arg(Arg::new("content").required(true)),
		)
		.subcommand(Command::new("read").about("Read a file's content").arg(Arg::new("path").required(true)))
		.subcommand(Command::new("ls").about("List a directory's children").arg(Arg::new("path").required(true)))
		.subcommand(
			Command::new("sync")
				.about("Sync operations")
				.subcommand_required(true)
				.subcommand(
					Command::new("push")
						.about("Push the current state of a path to a peer's outbox")
						.arg(Arg::new("path").required(true))
						.arg(Arg::new("outbox").long("outbox").value_name("FILE").required(true)),
				)
				.subcommand(Command::new("status").about("Show pending sync state for known peers")),
		)
		.get_matches();

	let vfsync_dir = init_vfsync_dir();
	let peer_id = matches.get_one::<String>("peer").cloned().unwrap_or_else(|| "local".to_string());

	if matches.subcommand_matches("init").is_some() {
		let _kernel = open_kernel(&vfsync_dir)?;
		println!("vfsync store ready at {:?}", vfsync_dir);
		return Ok(());
	}

	if let Some(sub) = matches.subcommand_matches("mount") {
		let kernel = open_kernel(&vfsync_dir)?;
		let registry = ModuleRegistry::new(&kernel);
		let name = sub.get_one::<String>("name").expect("required");
		let path = sub.get_one::<String>("path").expect("required");
		let module = registry.mount(name, path, sub.get_flag("protected"), !sub.get_flag("no-sync"), now_ms())?;
		println!("mounted '{}' at {} (root {})", module.name, path, module.root_node_id);
		return Ok(());
	}

	if let Some(sub) = matches.subcommand_matches("write") {
		let kernel = open_kernel(&vfsync_dir)?;
		let path = sub.get_one::<String>("path").expect("required");
		let content = sub.get_one::<String>("content").expect("required");
		let node = kernel.write(path, content.as_bytes(), now_ms())?;
		println!("wrote {} bytes to {}", node.size, path);
		return Ok(());
	}

	if let Some(sub) = matches.subcommand_matches("read") {
		let kernel = open_kernel(&vfsync_dir)?;
		let path = sub.get_one::<String>("path").expect("required");
		let data = kernel.read(path)?;
		print!("{}", String::from_utf8_lossy(&data));
		return Ok(());
	}

	if let Some(sub) = matches.subcommand_matches("ls") {
		let kernel = open_kernel(&vfsync_dir)?;
		let path = sub.get_one::<String>("path").expect("required");
		for child in kernel.readdir(path)? {
			let marker = if child.kind == NodeKind::Directory { "/" } else { "" };
			println!("{}{}", child.name, marker);
		}
		return Ok(());
	}

	if let Some(sync_matches) = matches.subcommand_matches("sync") {
		if let Some(sub) = sync_matches.subcommand_matches("push") {
			let kernel = open_kernel(&vfsync_dir)?;
			let path = sub.get_one::<String>("path").expect("required");
			let outbox = PathBuf::from(sub.get_one::<String>("outbox").expect("required"));

			let config = vfsync::config::SyncConfig { peer_id: peer_id.clone(), ..Default::default() };
			let kernel = Arc::new(kernel);
			let executor = SyncExecutor::new(Arc::clone(&kernel), config);
			enqueue_tree(&kernel, &executor, path)?;

			let mut transport = FileTransport::new(outbox.clone());
			vfsync::sync::transport::reconnect_with_backoff(&mut transport, 3, std::time::Duration::from_millis(50))
				.await?;
			executor.push(&mut transport, now_ms()).await?;

			state_storage::ensure_module_tree(&kernel, now_ms())?;
			let mut cursor = state_storage::load_cursor(&kernel, &peer_id)?.unwrap_or(SyncCursor {
				sent_clock: VectorClock::new(),
				received_clock: VectorClock::new(),
			});
			cursor.sent_clock.increment(&peer_id);
			state_storage::save_cursor(&kernel, &peer_id, &cursor, now_ms())?;

			println!("pushed {} to outbox {:?} as peer '{}'", path, outbox, format_peer_label(&peer_id, 16));
			return Ok(());
		}

		if sync_matches.subcommand_matches("status").is_some() {
			let kernel = open_kernel(&vfsync_dir)?;
			state_storage::ensure_module_tree(&kernel, now_ms())?;
			let registry = ModuleRegistry::new(&kernel);
			println!("modules:");
			for module in registry.list()? {
				let sync_state = if module.sync_enabled { "sync" } else { "local-only" };
				println!("  {} ({}) root={}", module.name, sync_state, module.root_node_id);
			}
			match state_storage::load_cursor(&kernel, &peer_id)? {
				Some(cursor) => println!(
					"peer '{}': sent={:?} received={:?}",
					format_peer_label(&peer_id, 16),
					cursor.sent_clock,
					cursor.received_clock
				),
				None => println!("peer '{}': no sync history yet", format_peer_label(&peer_id, 16)),
			}
			return Ok(());
		}
	}

	Ok(())
}

// vim: ts=4
