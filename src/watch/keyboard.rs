//! Keyboard path — `q` + Enter on stdin requests shutdown.
//!
//! Reads run on a dedicated OS thread rather than a runtime blocking task:
//! a blocked stdin read can only be released by input, and a runtime
//! blocking task would hold up runtime shutdown until it returns. The
//! thread reports its exit over a oneshot so the caller can wait for it
//! with a bound and otherwise leave it detached.

use std::io::BufRead;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

use crate::cancel::CancellationToken;

/// Why the listener stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardExit {
    /// The user typed `q`.
    QuitCommand,
    /// A line arrived after cancellation was requested by another path.
    CancelledElsewhere,
    /// stdin was closed.
    EndOfInput,
    /// stdin could not be read.
    ReadError,
}

pub fn is_quit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("q")
}

/// Consume lines until a quit command, cancellation, EOF or read error.
///
/// Lines are decoded lossily: stray non-UTF-8 input is just another
/// ignored line, not a reason to stop listening.
pub fn watch_lines<R: BufRead>(mut reader: R, token: &CancellationToken) -> KeyboardExit {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => return KeyboardExit::EndOfInput,
            Ok(_) => {}
            Err(e) => {
                debug!("stdin read failed: {} — keyboard quit disabled", e);
                return KeyboardExit::ReadError;
            }
        }

        if is_quit_command(&String::from_utf8_lossy(&buf)) {
            token.request();
            return KeyboardExit::QuitCommand;
        }
        if token.is_requested() {
            return KeyboardExit::CancelledElsewhere;
        }
    }
}

pub struct KeyboardListener {
    done: oneshot::Receiver<KeyboardExit>,
}

impl KeyboardListener {
    /// Listen on the process's stdin.
    pub fn spawn(token: CancellationToken) -> std::io::Result<Self> {
        Self::spawn_with(|| std::io::stdin().lock(), token)
    }

    /// Listen on a reader built inside the listener thread.
    pub fn spawn_with<R, F>(make_reader: F, token: CancellationToken) -> std::io::Result<Self>
    where
        R: BufRead + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        std::thread::Builder::new()
            .name("btcwatch-stdin".into())
            .spawn(move || {
                let exit = watch_lines(make_reader(), &token);
                debug!(?exit, "Keyboard listener stopped");
                let _ = tx.send(exit);
            })?;
        Ok(Self { done: rx })
    }

    /// Wait up to `timeout` for the listener thread to finish.
    ///
    /// Returns `None` if it is still blocked on input; the thread is then
    /// left detached and ends with the process.
    pub async fn join(self, timeout: Duration) -> Option<KeyboardExit> {
        match tokio::time::timeout(timeout, self.done).await {
            Ok(Ok(exit)) => Some(exit),
            Ok(Err(_)) => None,
            Err(_) => {
                debug!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Keyboard listener still waiting for input — detaching"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_quit_command_matching() {
        assert!(is_quit_command("q"));
        assert!(is_quit_command("Q"));
        assert!(is_quit_command("  q \r"));
        assert!(!is_quit_command("quit"));
        assert!(!is_quit_command(""));
        assert!(!is_quit_command("qq"));
    }

    #[test]
    fn test_quit_requests_cancellation() {
        let token = CancellationToken::new();
        let exit = watch_lines(Cursor::new("hello\n\n  Q  \nnever read\n"), &token);
        assert_eq!(exit, KeyboardExit::QuitCommand);
        assert!(token.is_requested());
    }

    #[test]
    fn test_other_input_is_ignored_until_eof() {
        let token = CancellationToken::new();
        let exit = watch_lines(Cursor::new("a\nquit\nexit\n"), &token);
        assert_eq!(exit, KeyboardExit::EndOfInput);
        assert!(!token.is_requested());
    }

    #[test]
    fn test_invalid_utf8_line_is_ignored() {
        let token = CancellationToken::new();
        let exit = watch_lines(Cursor::new(b"\xff\xfe\nq\n".to_vec()), &token);
        assert_eq!(exit, KeyboardExit::QuitCommand);
        assert!(token.is_requested());
    }

    #[test]
    fn test_quit_without_trailing_newline() {
        let token = CancellationToken::new();
        assert_eq!(watch_lines(Cursor::new("q"), &token), KeyboardExit::QuitCommand);
    }

    #[test]
    fn test_observes_cancellation_after_next_line() {
        let token = CancellationToken::new();
        token.request();
        let exit = watch_lines(Cursor::new("x\ny\n"), &token);
        assert_eq!(exit, KeyboardExit::CancelledElsewhere);
    }

    #[test]
    fn test_empty_input_ends_silently() {
        let token = CancellationToken::new();
        assert_eq!(watch_lines(Cursor::new(""), &token), KeyboardExit::EndOfInput);
        assert!(!token.is_requested());
    }

    #[test]
    fn test_read_error_stops_listener() {
        struct Broken;
        impl std::io::Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "stdin closed"))
            }
        }

        let token = CancellationToken::new();
        let exit = watch_lines(std::io::BufReader::new(Broken), &token);
        assert_eq!(exit, KeyboardExit::ReadError);
        assert!(!token.is_requested());
    }

    #[tokio::test]
    async fn test_spawned_listener_reports_exit() {
        let token = CancellationToken::new();
        let listener =
            KeyboardListener::spawn_with(|| Cursor::new("q\n"), token.clone()).unwrap();

        let exit = listener.join(Duration::from_secs(2)).await;
        assert_eq!(exit, Some(KeyboardExit::QuitCommand));
        assert!(token.is_requested());
    }

    #[tokio::test]
    async fn test_join_is_bounded_when_input_never_arrives() {
        struct Stalled;
        impl std::io::Read for Stalled {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                std::thread::sleep(Duration::from_secs(3600));
                Ok(0)
            }
        }

        let token = CancellationToken::new();
        let listener =
            KeyboardListener::spawn_with(|| std::io::BufReader::new(Stalled), token.clone())
                .unwrap();

        let started = std::time::Instant::now();
        let exit = listener.join(Duration::from_millis(50)).await;
        assert_eq!(exit, None);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
