use std::time::Duration;

use tracing::warn;

use crate::error::ClientError;

/// Retry behaviour for idempotent reads.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: usize,
    /// Delay before each retry; the last entry repeats when there are more
    /// retries than delays.
    pub delays: Vec<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delays: vec![Duration::from_secs(1), Duration::from_secs(2)],
        }
    }
}

impl RetryConfig {
    /// Single attempt.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delays: Vec::new(),
        }
    }

    pub fn with_retries(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    fn delay(&self, attempt: usize) -> Duration {
        self.delays
            .get(attempt)
            .or(self.delays.last())
            .copied()
            .unwrap_or(Duration::from_secs(1))
    }
}

/// Send the request built by `build` with backoff.
///
/// Retries on network errors and 5xx responses.
/// Returns immediately on success, 3xx or 4xx.
pub async fn retry_send<F>(build: F, config: &RetryConfig) -> Result<reqwest::Response, ClientError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let max_attempts = config.max_retries + 1;
    let mut attempt = 0;

    loop {
        let last = attempt + 1 >= max_attempts;
        match build().send().await {
            Ok(resp) if resp.status().is_server_error() && !last => {
                let delay = config.delay(attempt);
                warn!(
                    "request attempt {}/{} failed (HTTP {}), retrying in {:?}",
                    attempt + 1,
                    max_attempts,
                    resp.status(),
                    delay,
                );
                tokio::time::sleep(delay).await;
            }
            Ok(resp) => return Ok(resp),
            Err(e) if !last => {
                let delay = config.delay(attempt);
                warn!(
                    "request attempt {}/{} failed ({}), retrying in {:?}",
                    attempt + 1,
                    max_attempts,
                    e,
                    delay,
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e.into()),
        }
        attempt += 1;
    }
}
