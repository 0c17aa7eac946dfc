//! Exit watcher — the two producers of a stop request.
//!
//! Both feed the same [`CancellationToken`]; whichever fires first wins
//! and the other becomes a no-op.

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::cancel::CancellationToken;

pub mod keyboard;
pub mod signals;

use keyboard::KeyboardListener;

pub struct ExitWatcher {
    signals: Option<JoinHandle<()>>,
    keyboard: Option<KeyboardListener>,
}

impl ExitWatcher {
    /// Install the signal listener and start reading stdin.
    pub fn start(token: &CancellationToken) -> Self {
        let signals = match signals::spawn(token.clone()) {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("Failed to listen for shutdown signals: {} — use q to quit", e);
                None
            }
        };
        let keyboard = match KeyboardListener::spawn(token.clone()) {
            Ok(k) => Some(k),
            Err(e) => {
                warn!("Could not start keyboard listener: {} — use Ctrl-C to quit", e);
                None
            }
        };
        debug!(
            signals = signals.is_some(),
            keyboard = keyboard.is_some(),
            "Exit watcher started"
        );
        Self { signals, keyboard }
    }

    /// Stop the signal listener and give the keyboard thread `join_timeout`
    /// to finish.
    pub async fn shutdown(self, join_timeout: Duration) {
        if let Some(signals) = self.signals {
            signals.abort();
        }
        if let Some(keyboard) = self.keyboard {
            let exit = keyboard.join(join_timeout).await;
            debug!(?exit, "Exit watcher shut down");
        }
    }
}
