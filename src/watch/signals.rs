//! OS signal path — SIGINT (Ctrl-C) and, on Unix, SIGTERM.
//!
//! Handlers are registered synchronously before the listener task is
//! spawned, so a signal sent right after startup is never missed. The
//! runtime's own handler does the async-signal-safe part; the listener
//! task only flips the cancellation flag once woken.

use tokio::task::JoinHandle;
use tracing::info;

use crate::cancel::CancellationToken;

/// Registered termination signal streams.
#[cfg(unix)]
pub struct ShutdownSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Completes when either signal arrives.
    pub async fn recv(&mut self) {
        tokio::select! {
            _ = self.interrupt.recv() => {},
            _ = self.terminate.recv() => {},
        }
    }
}

#[cfg(windows)]
pub struct ShutdownSignals {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(windows)]
impl ShutdownSignals {
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    pub async fn recv(&mut self) {
        self.ctrl_c.recv().await;
    }
}

/// Register the handlers and spawn the listener. On error no task is
/// started and the caller falls back to the keyboard path.
pub fn spawn(token: CancellationToken) -> std::io::Result<JoinHandle<()>> {
    let mut signals = ShutdownSignals::install()?;
    Ok(tokio::spawn(async move {
        signals.recv().await;
        token.request();
        info!("Shutdown signal received");
    }))
}
