//! Opt-in retry policy for HomeHero requests.
//!
//! Nothing is retried unless the request carries a [`RetryConfig`] or the
//! client is configured with `max_retries > 0`. 401 and 403 are never
//! retried: they go straight to the session teardown.

use crate::client::utils::{exponential_backoff, is_access_denied_status, is_retryable_status};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// How often, and how patiently, one request is retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every further one.
    pub initial_backoff: Duration,
    /// Cap on any single delay, server-requested ones included.
    pub max_backoff: Duration,
    /// Statuses retried in addition to the transient set
    /// (408, 425, 429, 502, 503, 504).
    pub extra_statuses: Vec<u16>,
    /// Wait as long as the server's `Retry-After` asks.
    pub respect_retry_after: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            extra_statuses: Vec::new(),
            respect_retry_after: true,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    #[must_use]
    pub fn with_initial_backoff(mut self, duration: Duration) -> Self {
        self.initial_backoff = duration;
        self
    }

    #[must_use]
    pub fn with_max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff = duration;
        self
    }

    /// Also retry `status`. 401 and 403 are refused.
    #[must_use]
    pub fn with_retry_on_status(mut self, status: u16) -> Self {
        if !is_access_denied_status(status) && !self.extra_statuses.contains(&status) {
            self.extra_statuses.push(status);
        }
        self
    }

    #[must_use]
    pub fn with_respect_retry_after(mut self, respect: bool) -> Self {
        self.respect_retry_after = respect;
        self
    }

    pub fn retries_status(&self, status: u16) -> bool {
        !is_access_denied_status(status)
            && (is_retryable_status(status) || self.extra_statuses.contains(&status))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    Retry(Duration),
    DontRetry,
}

/// Attempt counter for one request.
#[derive(Debug, Clone)]
pub struct RetryState {
    /// Retries granted so far.
    pub attempts: u32,
    config: RetryConfig,
}

impl RetryState {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            attempts: 0,
            config,
        }
    }

    /// The transport failed outright.
    pub fn should_retry_error(&mut self) -> RetryDecision {
        self.grant(None)
    }

    /// The server answered with a non-2xx `status`.
    pub fn should_retry_status(
        &mut self,
        status: u16,
        retry_after: Option<Duration>,
    ) -> RetryDecision {
        if !self.config.retries_status(status) {
            return RetryDecision::DontRetry;
        }
        self.grant(retry_after)
    }

    fn grant(&mut self, retry_after: Option<Duration>) -> RetryDecision {
        if self.attempts >= self.config.max_retries {
            return RetryDecision::DontRetry;
        }
        let base_ms = u64::try_from(self.config.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let backoff = exponential_backoff(self.attempts, base_ms);
        self.attempts += 1;

        let wait = match retry_after {
            Some(requested) if self.config.respect_retry_after => requested,
            _ => backoff,
        };
        RetryDecision::Retry(wait.min(self.config.max_backoff))
    }
}

/// `Retry-After` as delta-seconds or an HTTP date. Dates in the past mean
/// "now".
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - Utc::now()).to_std().unwrap_or(Duration::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses_only() {
        let config = RetryConfig::default();
        assert!(config.retries_status(503));
        assert!(config.retries_status(429));
        assert!(!config.retries_status(500));
        assert!(!config.retries_status(401));
    }

    #[test]
    fn test_access_denied_cannot_be_added() {
        let config = RetryConfig::default()
            .with_retry_on_status(403)
            .with_retry_on_status(500);
        assert!(!config.retries_status(403));
        assert!(config.retries_status(500));
        assert_eq!(config.extra_statuses, vec![500]);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = RetryConfig::new()
            .with_max_retries(4)
            .with_initial_backoff(Duration::from_millis(100))
            .with_max_backoff(Duration::from_millis(300));
        let mut state = RetryState::new(config);
        let waits: Vec<_> = (0..5).map(|_| state.should_retry_error()).collect();
        assert_eq!(
            waits,
            vec![
                RetryDecision::Retry(Duration::from_millis(100)),
                RetryDecision::Retry(Duration::from_millis(200)),
                RetryDecision::Retry(Duration::from_millis(300)),
                RetryDecision::Retry(Duration::from_millis(300)),
                RetryDecision::DontRetry,
            ]
        );
    }

    #[test]
    fn test_no_retry() {
        let mut state = RetryState::new(RetryConfig::no_retry());
        assert_eq!(state.should_retry_status(503, None), RetryDecision::DontRetry);
        assert_eq!(state.should_retry_error(), RetryDecision::DontRetry);
    }

    #[test]
    fn test_retry_after() {
        assert_eq!(parse_retry_after(" 2 "), Some(Duration::from_secs(2)));
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"),
            Some(Duration::ZERO)
        );
        assert_eq!(parse_retry_after("soon"), None);

        let mut state = RetryState::new(RetryConfig::default());
        assert_eq!(
            state.should_retry_status(429, Some(Duration::from_secs(2))),
            RetryDecision::Retry(Duration::from_secs(2))
        );

        let ignoring = RetryConfig::default().with_respect_retry_after(false);
        let mut state = RetryState::new(ignoring);
        assert_eq!(
            state.should_retry_status(429, Some(Duration::from_secs(2))),
            RetryDecision::Retry(Duration::from_millis(500))
        );
    }
}
