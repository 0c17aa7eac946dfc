//! Time seams — wall-clock timestamps and interruptible waits.
//!
//! Both are traits so tests can run the retry and countdown logic
//! without real delays.

use async_trait::async_trait;
use std::time::Duration;

use crate::cancel::CancellationToken;

/// Display format for "last updated" timestamps, e.g. `10/19/2026 at 09:41 AM`.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y at %I:%M %p";

/// Produces human-readable timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> String;
}

/// Local wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Suspends the current task for a duration.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleep for `duration` unless cancellation is requested first.
///
/// Returns `true` if the wait was cut short by the token.
pub async fn sleep_or_cancel(
    sleeper: &dyn Sleeper,
    duration: Duration,
    token: &CancellationToken,
) -> bool {
    if token.is_requested() {
        return true;
    }
    tokio::select! {
        _ = sleeper.sleep(duration) => token.is_requested(),
        _ = token.cancelled() => true,
    }
}
