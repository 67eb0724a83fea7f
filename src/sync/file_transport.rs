//! File-based transport adapter
//!
//! Grounded on the teacher's `connect.rs` (treat a peer address as either a
//! local directory or an `ssh`-spawned subprocess, communicating over a pipe)
//! generalized to the async `Transport` trait: a peer address here is a
//! local outbox file that packets are appended to as newline-delimited JSON,
//! standing in for a real socket/SSH pipe so the CLI's `sync push` has a
//! concrete, inspectable transport without committing to a wire protocol.

use crate::error::{SyncError, TransportError};
use crate::sync::packet::SyncPacket;
use crate::sync::transport::{Transport, WireMessage};
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
enum FileMessage {
	Packet(SyncPacket),
	Heartbeat,
}

pub struct FileTransport {
	outbox: PathBuf,
	connected: bool,
}

impl FileTransport {
	pub fn new(outbox: PathBuf) -> Self {
		FileTransport { outbox, connected: false }
	}
}

#[async_trait]
impl Transport for FileTransport {
	async fn connect(&mut self) -> Result<(), SyncError> {
		if let Some(parent) = self.outbox.parent() {
			std::fs::create_dir_all(parent).map_err(crate::error::boxed_error)?;
		}
		self.connected = true;
		Ok(())
	}

	async fn disconnect(&mut self) -> Result<(), SyncError> {
		self.connected = false;
		Ok(())
	}

	fn is_connected(&self) -> bool {
		self.connected
	}

	async fn send_packet(&mut self, packet: &SyncPacket) -> Result<(), SyncError> {
		if !self.connected {
			return Err(SyncError::Transport(TransportError::ConnectionFailed {
				message: "not connected".to_string(),
				retryable: true,
			}));
		}
		let line = serde_json::to_string(&FileMessage::Packet(packet.clone())).map_err(crate::error::boxed_error)?;
		let mut file =
			std::fs::OpenOptions::new().create(true).append(true).open(&self.outbox).map_err(crate::error::boxed_error)?;
		writeln!(file, "{line}").map_err(crate::error::boxed_error)?;
		Ok(())
	}

	async fn send_chunk(&mut self, _content_hash: &str, _index: u32, _data: &[u8]) -> Result<(), SyncError> {
		Ok(())
	}

	async fn request_chunk(&mut self, _content_hash: &str, _index: u32) -> Result<Vec<u8>, SyncError> {
		Ok(Vec::new())
	}

	/// File transports are write-only outboxes here; there's nothing to
	/// receive (a peer reading this file would do so out-of-band).
	async fn recv(&mut self) -> Result<Option<WireMessage>, SyncError> {
		Ok(None)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_send_packet_appends_json_line() {
		let dir = tempfile::tempdir().unwrap();
		let outbox = dir.path().join("peer-a.outbox");
		let mut transport = FileTransport::new(outbox.clone());
		transport.connect().await.unwrap();

		let packet = SyncPacket { peer_id: "local".to_string(), changes: vec![] };
		transport.send_packet(&packet).await.unwrap();

		let contents = std::fs::read_to_string(&outbox).unwrap();
		assert_eq!(contents.lines().count(), 1);
	}

	#[tokio::test]
	async fn test_send_without_connect_fails() {
		let dir = tempfile::tempdir().unwrap();
		let mut transport = FileTransport::new(dir.path().join("x.outbox"));
		let packet = SyncPacket { peer_id: "local".to_string(), changes: vec![] };
		assert!(transport.send_packet(&packet).await.is_err());
	}
}

// vim: ts=4
