//! Process-wide cancellation token — the single shutdown primitive.
//!
//! Two producers race to set it (OS signal task, keyboard thread);
//! every long-running wait in the engine polls it. The flag is
//! monotone: once requested it is never cleared for the rest of the run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

struct Inner {
    requested: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation flag with an async wakeup.
///
/// Cloning is cheap and every clone observes the same flag.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                requested: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Request cancellation. Idempotent; safe from any thread or task.
    pub fn request(&self) {
        // Only the first writer wakes waiters; later calls are no-ops.
        if !self.inner.requested.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    /// Non-blocking read of the flag.
    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent
            // `request()` cannot slip between the check and the await.
            let notified = self.inner.notify.notified();
            if self.is_requested() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("requested", &self.is_requested())
            .finish()
    }
}
