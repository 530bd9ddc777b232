//! Graceful shutdown coordination.
//!
//! A [`ShutdownCoordinator`] is shared by every per-language job of a run.
//! Requesting shutdown (Ctrl+C in the CLI) wakes jobs waiting for a
//! concurrency slot, sleeping through a cooldown or streaming a file; each
//! of them discards its partial file and reports itself cancelled.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Shared handle to a shutdown coordinator.
pub type SharedShutdown = Arc<ShutdownCoordinator>;

/// Coordinates graceful shutdown across async tasks.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    is_shutdown: AtomicBool,
    notify: Notify,
}

impl ShutdownCoordinator {
    /// Create a new coordinator.
    pub fn new() -> Self {
        Self {
            is_shutdown: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Create a new shared coordinator wrapped in [`Arc`].
    pub fn shared() -> SharedShutdown {
        Arc::new(Self::new())
    }

    /// Request shutdown. Notifies all registered waiters exactly once.
    pub fn request_shutdown(&self) {
        if !self.is_shutdown.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.is_shutdown.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is requested. Returns immediately if already set.
    pub async fn wait_for_shutdown(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent request is not missed
        notified.as_mut().enable();
        if self.is_shutdown_requested() {
            return;
        }
        notified.await;
    }

    /// Drive `fut` to completion unless shutdown is requested first.
    ///
    /// Returns `None` when shutdown won.
    pub async fn run_until_shutdown<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.is_shutdown_requested() {
            return None;
        }
        tokio::select! {
            output = fut => Some(output),
            _ = self.wait_for_shutdown() => None,
        }
    }
}

/// [`ShutdownCoordinator::run_until_shutdown`] for an optional handle.
pub async fn run_unless_shutdown<F: Future>(
    shutdown: Option<&SharedShutdown>,
    fut: F,
) -> Option<F::Output> {
    match shutdown {
        Some(shutdown) => shutdown.run_until_shutdown(fut).await,
        None => Some(fut.await),
    }
}
