//! Retry policy — maps an observed failure to "give up" or "wait, then retry".
//!
//! Transient classes (no response, 429, 5xx) get a backoff; everything
//! else is a contract break that will not fix itself within a cycle.

use std::time::Duration;

use super::FetchError;
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    NoRetry,
    RetryAfter(Duration),
}

/// Stateless retry policy. The attempt budget is per fetch, never carried
/// across poll cycles.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub transport_backoff: Duration,
    pub rate_limit_backoff: Duration,
    pub server_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            transport_backoff: Duration::from_secs(5),
            rate_limit_backoff: Duration::from_secs(10),
            server_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts,
            transport_backoff: Duration::from_secs(config.transport_backoff_secs),
            rate_limit_backoff: Duration::from_secs(config.rate_limit_backoff_secs),
            server_backoff: Duration::from_secs(config.server_backoff_secs),
        }
    }

    pub fn classify(&self, err: &FetchError) -> RetryDecision {
        match err {
            FetchError::Transport(_) => RetryDecision::RetryAfter(self.transport_backoff),
            FetchError::RateLimited => RetryDecision::RetryAfter(self.rate_limit_backoff),
            FetchError::Server(_) => RetryDecision::RetryAfter(self.server_backoff),
            FetchError::Client(_) | FetchError::UnexpectedStatus(_) | FetchError::Decode(_) => {
                RetryDecision::NoRetry
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    fn secs(n: u64) -> RetryDecision {
        RetryDecision::RetryAfter(Duration::from_secs(n))
    }

    #[test]
    fn test_transient_failures_back_off() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.classify(&FetchError::Transport("connect refused".into())), secs(5));
        assert_eq!(policy.classify(&FetchError::RateLimited), secs(10));
        assert_eq!(
            policy.classify(&FetchError::Server(StatusCode::INTERNAL_SERVER_ERROR)),
            secs(5)
        );
        assert_eq!(
            policy.classify(&FetchError::Server(StatusCode::SERVICE_UNAVAILABLE)),
            secs(5)
        );
    }

    #[test]
    fn test_terminal_failures_do_not_retry() {
        let policy = RetryPolicy::default();
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
        ] {
            assert_eq!(policy.classify(&FetchError::Client(status)), RetryDecision::NoRetry);
        }
        assert_eq!(
            policy.classify(&FetchError::Decode("missing field".into())),
            RetryDecision::NoRetry
        );
        assert_eq!(
            policy.classify(&FetchError::UnexpectedStatus(StatusCode::MOVED_PERMANENTLY)),
            RetryDecision::NoRetry
        );
    }

    #[test]
    fn test_from_config_uses_configured_backoffs() {
        let config = Config {
            max_attempts: 5,
            rate_limit_backoff_secs: 30,
            ..Config::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.classify(&FetchError::RateLimited), secs(30));
    }
}
