//! Transport adapter contract (§4.q, §6.3)
//!
//! Grounded on the teacher's `protocol::traits::SyncProtocol`: an
//! `async_trait` defining the operations the sync engine needs without
//! committing to a transport, plus request/response correlation. Reconnect
//! with exponential backoff is new (the teacher reconnects SSH subprocesses
//! without backoff in `connection.rs`); the backoff+jitter loop here follows
//! the same `tokio::time::sleep` idiom.

use crate::error::{SyncError, TransportError};
use crate::sync::packet::SyncPacket;
use async_trait::async_trait;
use std::time::Duration;

/// Wire messages exchanged beyond packets (§6.3's message catalog).
#[derive(Debug, Clone)]
pub enum WireMessage {
	Packet(SyncPacket),
	RequestChunk { content_hash: String, index: u32 },
	ChunkData { content_hash: String, index: u32, data: Vec<u8> },
	Heartbeat,
	Ack { peer_id: String },
}

/// The contract a transport adapter must fulfil. Implementations own the
/// underlying connection (TCP, WebSocket, SSH pipe, in-process channel for
/// tests); the sync engine (`executor`) depends only on this trait.
#[async_trait]
pub trait Transport: Send + Sync {
	async fn connect(&mut self) -> Result<(), SyncError>;
	async fn disconnect(&mut self) -> Result<(), SyncError>;
	fn is_connected(&self) -> bool;

	async fn send_packet(&mut self, packet: &SyncPacket) -> Result<(), SyncError>;
	async fn send_chunk(
		&mut self,
		content_hash: &str,
		index: u32,
		data: &[u8],
	) -> Result<(), SyncError>;
	async fn request_chunk(&mut self, content_hash: &str, index: u32) -> Result<Vec<u8>, SyncError>;

	/// Receive the next inbound message, blocking until one arrives or the
	/// connection closes.
	async fn recv(&mut self) -> Result<Option<WireMessage>, SyncError>;
}

/// Reconnect `transport` with exponential backoff and jitter, giving up
/// after `max_attempts` (§4.q, §7 `TransportError::ReconnectExhausted`).
pub async fn reconnect_with_backoff(
	transport: &mut dyn Transport,
	max_attempts: u32,
	base_delay: Duration,
) -> Result<(), SyncError> {
	let mut attempt = 0;
	loop {
		match transport.connect().await {
			Ok(()) => return Ok(()),
			Err(e) => {
				attempt += 1;
				if attempt >= max_attempts {
					return Err(SyncError::Transport(TransportError::ReconnectExhausted {
						attempts: attempt,
					}));
				}
				let backoff = base_delay.saturating_mul(1 << attempt.min(10));
				let jitter = Duration::from_millis((attempt as u64 * 17) % 100);
				tracing::warn!(
					attempt,
					error = %e,
					"reconnect attempt failed, backing off {:?}",
					backoff + jitter
				);
				tokio::time::sleep(backoff + jitter).await;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::Arc;

	struct FlakyTransport {
		attempts_before_success: u32,
		attempts: Arc<AtomicU32>,
		connected: bool,
	}

	#[async_trait]
	impl Transport for FlakyTransport {
		async fn connect(&mut self) -> Result<(), SyncError> {
			let n = self.attempts.fetch_add(1, Ordering::SeqCst);
			if n + 1 >= self.attempts_before_success {
				self.connected = true;
				Ok(())
			} else {
				Err(SyncError::Transport(TransportError::ConnectionFailed {
					message: "refused".to_string(),
					retryable: true,
				}))
			}
		}
		async fn disconnect(&mut self) -> Result<(), SyncError> {
			self.connected = false;
			Ok(())
		}
		fn is_connected(&self) -> bool {
			self.connected
		}
		async fn send_packet(&mut self, _packet: &SyncPacket) -> Result<(), SyncError> {
			Ok(())
		}
		async fn send_chunk(&mut self, _h: &str, _i: u32, _d: &[u8]) -> Result<(), SyncError> {
			Ok(())
		}
		async fn request_chunk(&mut self, _h: &str, _i: u32) -> Result<Vec<u8>, SyncError> {
			Ok(Vec::new())
		}
		async fn recv(&mut self) -> Result<Option<WireMessage>, SyncError> {
			Ok(None)
		}
	}

	#[tokio::test]
	async fn test_reconnect_succeeds_within_attempts() {
		let mut transport =
			FlakyTransport { attempts_before_success: 3, attempts: Arc::new(AtomicU32::new(0)), connected: false };
		reconnect_with_backoff(&mut transport, 5, Duration::from_millis(1)).await.unwrap();
		assert!(transport.is_connected());
	}

	#[tokio::test]
	async fn test_reconnect_gives_up_after_max_attempts() {
		let mut transport = FlakyTransport {
			attempts_before_success: 100,
			attempts: Arc::new(AtomicU32::new(0)),
			connected: false,
		};
		let result = reconnect_with_backoff(&mut transport, 3, Duration::from_millis(1)).await;
		assert!(matches!(
			result,
			Err(SyncError::Transport(TransportError::ReconnectExhausted { attempts: 3 }))
		));
	}
}

// vim: ts=4
