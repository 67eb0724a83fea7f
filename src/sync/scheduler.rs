//! Adaptive push scheduler (§4.o)
//!
//! Grounded on the teacher's plain `tokio::spawn` + `tokio::time::sleep`
//! idiom (`utils/lock.rs`, `tui/event.rs`) rather than a dedicated
//! scheduling crate. Debounces bursts of local changes, but forces a push
//! once `max_wait_time` or `max_pending_count` is hit, and never re-pushes
//! more often than `min_sync_interval`.

use crate::config::SyncConfig;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Drives one background task that calls a push callback on a debounced,
/// bounded schedule. `stop()` cancels the task; dropping the scheduler does
/// not (the task is detached via `tokio::spawn`), so callers that care
/// about clean shutdown should call `stop()` explicitly.
pub struct PushScheduler {
	pending_count: Arc<AtomicUsize>,
	notify: Arc<Notify>,
	stopped: Arc<AtomicBool>,
}

impl PushScheduler {
	/// Start the scheduler, spawning the debounce task. `on_push` is called
	/// (on the tokio runtime) whenever a push should happen; it receives the
	/// pending count at the moment the decision was made.
	pub fn start<F>(config: SyncConfig, on_push: F) -> Self
	where
		F: Fn(usize) + Send + Sync + 'static,
	{
		let pending_count = Arc::new(AtomicUsize::new(0));
		let notify = Arc::new(Notify::new());
		let stopped = Arc::new(AtomicBool::new(false));

		let task_pending = Arc::clone(&pending_count);
		let task_notify = Arc::clone(&notify);
		let task_stopped = Arc::clone(&stopped);
		tokio::spawn(async move {
			let mut last_push = Instant::now();
			loop {
				if task_stopped.load(Ordering::SeqCst) {
					return;
				}
				let wait_result =
					tokio::time::timeout(config.debounce_delay, task_notify.notified()).await;
				if task_stopped.load(Ordering::SeqCst) {
					return;
				}
				let count = task_pending.load(Ordering::SeqCst);
				if count == 0 {
					continue;
				}
				let since_last = last_push.elapsed();
				let debounced = wait_result.is_err(); // no new change arrived during debounce_delay
				let over_max_wait = since_last >= config.max_wait_time;
				let over_max_pending = count >= config.max_pending_count;
				if !(debounced || over_max_wait || over_max_pending) {
					continue;
				}
				if since_last < config.min_sync_interval {
					tokio::time::sleep(config.min_sync_interval - since_last).await;
				}
				let flushed = task_pending.swap(0, Ordering::SeqCst);
				on_push(flushed);
				last_push = Instant::now();
			}
		});

		PushScheduler { pending_count, notify, stopped }
	}

	/// Record a local change; wakes the debounce loop.
	pub fn notify_change(&self) {
		self.pending_count.fetch_add(1, Ordering::SeqCst);
		self.notify.notify_one();
	}

	pub fn pending_count(&self) -> usize {
		self.pending_count.load(Ordering::SeqCst)
	}

	/// Force an immediate push regardless of debounce/min-interval state.
	pub fn force_sync(&self) {
		self.notify.notify_one();
	}

	pub fn stop(&self) {
		self.stopped.store(true, Ordering::SeqCst);
		self.notify.notify_one();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::AtomicUsize as Counter;
	use std::time::Duration;

	#[tokio::test]
	async fn test_debounced_push_fires_after_quiet_period() {
		let config = SyncConfig {
			debounce_delay: Duration::from_millis(20),
			min_sync_interval: Duration::from_millis(0),
			..SyncConfig::default()
		};
		let pushes = Arc::new(Counter::new(0));
		let pushes_clone = Arc::clone(&pushes);
		let scheduler = PushScheduler::start(config, move |_| {
			pushes_clone.fetch_add(1, Ordering::SeqCst);
		});
		scheduler.notify_change();
		tokio::time::sleep(Duration::from_millis(100)).await;
		scheduler.stop();
		assert_eq!(pushes.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_max_pending_count_forces_push() {
		let config = SyncConfig {
			debounce_delay: Duration::from_secs(5),
			max_pending_count: 3,
			min_sync_interval: Duration::from_millis(0),
			..SyncConfig::default()
		};
		let pushes = Arc::new(Counter::new(0));
		let pushes_clone = Arc::clone(&pushes);
		let scheduler = PushScheduler::start(config, move |_| {
			pushes_clone.fetch_add(1, Ordering::SeqCst);
		});
		for _ in 0..3 {
			scheduler.notify_change();
		}
		tokio::time::sleep(Duration::from_millis(100)).await;
		scheduler.stop();
		assert_eq!(pushes.load(Ordering::SeqCst), 1);
	}
}

// vim: ts=4
