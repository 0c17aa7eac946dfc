//! Cancellable countdown between poll cycles.
//!
//! Waits `total` ticks, reporting `(elapsed, total)` before each tick's
//! sleep. The token is checked before every tick, so a stop request is
//! honoured within at most one tick.

use std::time::Duration;

use crate::cancel::CancellationToken;
use crate::clock::{sleep_or_cancel, Sleeper};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    /// All ticks elapsed.
    Complete,
    /// Stopped early; `elapsed` ticks had been reported.
    Cancelled { elapsed: u32 },
}

pub async fn run<F>(
    total: u32,
    mut on_tick: F,
    token: &CancellationToken,
    sleeper: &dyn Sleeper,
    tick: Duration,
) -> CountdownOutcome
where
    F: FnMut(u32, u32),
{
    for elapsed in 0..total {
        if token.is_requested() {
            return CountdownOutcome::Cancelled { elapsed };
        }
        on_tick(elapsed, total);
        if sleep_or_cancel(sleeper, tick, token).await {
            return CountdownOutcome::Cancelled { elapsed: elapsed + 1 };
        }
    }
    CountdownOutcome::Complete
}
