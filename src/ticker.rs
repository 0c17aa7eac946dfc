//! Ticker — the poll loop.
//!
//! Each cycle: fetch a reading, draw it, count down the interval with a
//! live progress line. Runs until the cancellation token is set, then
//! releases the exit watcher and says goodbye. A failed fetch only
//! affects its own cycle.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::clock::{Clock, Sleeper};
use crate::config::Config;
use crate::countdown::{self, CountdownOutcome};
use crate::display::{DisplayState, Renderer};
use crate::fetch::{Fetcher, RetryPolicy};
use crate::source::PriceSource;
use crate::watch::ExitWatcher;

/// Length of one countdown tick.
pub const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub successes: u64,
}

pub struct Ticker {
    fetcher: Fetcher,
    renderer: Arc<dyn Renderer>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    token: CancellationToken,
    interval: u32,
    tick: Duration,
    shutdown_join: Duration,
}

impl Ticker {
    pub fn new(
        config: &Config,
        source: Arc<dyn PriceSource>,
        renderer: Arc<dyn Renderer>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
        token: CancellationToken,
    ) -> Self {
        let fetcher = Fetcher::new(
            source,
            RetryPolicy::from_config(config),
            Arc::clone(&sleeper),
            token.clone(),
        );
        Self {
            fetcher,
            renderer,
            clock,
            sleeper,
            token,
            interval: config.interval_secs,
            tick: TICK,
            shutdown_join: Duration::from_millis(config.shutdown_join_ms),
        }
    }

    /// Override the tick length (tests run with very short ticks).
    #[cfg(test)]
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Poll until a stop is requested. Never fails: fetch errors are
    /// shown for their cycle and the loop carries on.
    pub async fn run(&self, watcher: Option<ExitWatcher>) -> RunSummary {
        let mut summary = RunSummary::default();

        while !self.token.is_requested() {
            let state = match self.poll_cycle().await {
                Some(state) => state,
                None => break,
            };
            summary.cycles += 1;
            if state.reading.is_valid() {
                summary.successes += 1;
            }
        }

        info!(
            cycles = summary.cycles,
            successes = summary.successes,
            "Stop requested — shutting down"
        );

        if let Some(watcher) = watcher {
            watcher.shutdown(self.shutdown_join).await;
        }
        self.renderer.farewell();
        summary
    }

    /// One fetch-then-wait cycle. `None` if cancellation arrived while
    /// fetching, in which case nothing is drawn.
    async fn poll_cycle(&self) -> Option<DisplayState> {
        let reading = self.fetcher.fetch().await;
        if self.token.is_requested() {
            return None;
        }

        let mut state = DisplayState {
            reading,
            updated_at: self.clock.now(),
            seconds_remaining: self.interval,
            total: self.interval,
        };
        self.renderer.render(&state);

        let outcome = countdown::run(
            self.interval,
            |elapsed, total| {
                state.seconds_remaining = total - elapsed;
                self.renderer.progress(&state);
            },
            &self.token,
            self.sleeper.as_ref(),
            self.tick,
        )
        .await;

        if let CountdownOutcome::Cancelled { elapsed } = outcome {
            debug!(elapsed, total = self.interval, "Countdown cancelled");
        }
        Some(state)
    }
}
