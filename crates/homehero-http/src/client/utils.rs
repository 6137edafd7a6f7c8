//! Utility functions for the HomeHero HTTP client.

use std::time::Duration;

pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 425 | 429 | 502 | 503 | 504)
}

pub fn is_access_denied_status(status: u16) -> bool {
    matches!(status, 401 | 403)
}

pub fn exponential_backoff(attempt: u32, base_ms: u64) -> Duration {
    let delay_ms = base_ms.saturating_mul(2_u64.pow(attempt.min(10)));
    Duration::from_millis(delay_ms)
}

/// Short, log-safe preview of a bearer token.
pub fn redact_token(token: &str) -> String {
    let preview: String = token.chars().take(6).collect();
    if preview.len() < token.len() {
        format!("{}…", preview)
    } else {
        "***".to_string()
    }
}

pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}
