//! Metric discovery and series fetching.

use std::future::Future;

use tracing::warn;

use vigil_api::{JOB_LABEL, METRIC_NAME_LABEL};
use vigil_core::export::parse_export;
use vigil_core::selector::selector_for;
use vigil_core::{Selection, SeriesMap};

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::retry::RetryConfig;

/// Anything that can answer an export query with a JSON-lines body.
pub trait MetricsSource: Send + Sync + 'static {
    fn fetch_export(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;
}

impl MetricsSource for ApiClient {
    fn fetch_export(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<String, ClientError>> + Send {
        self.export(selector)
    }
}

/// Available metric names and jobs. A list that failed to load is empty and
/// its error is kept for display.
#[derive(Debug, Default)]
pub struct Discovery {
    pub metric_names: Vec<String>,
    pub jobs: Vec<String>,
    pub errors: Vec<DiscoveryError>,
}

#[derive(Debug)]
pub struct DiscoveryError {
    pub label: &'static str,
    pub error: ClientError,
}

impl Discovery {
    /// True when any failure means the session is gone.
    pub fn session_expired(&self) -> bool {
        self.errors.iter().any(|e| e.error.is_session_expired())
    }

    /// One line suitable for a banner, or `None` when both lists loaded.
    pub fn error_summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| {
                let what = if e.label == METRIC_NAME_LABEL {
                    "metric names"
                } else {
                    "jobs"
                };
                format!("failed to load {what}: {}", e.error)
            })
            .collect();
        Some(parts.join("; "))
    }
}

/// Fetch metric names and jobs concurrently. One list failing does not
/// prevent the other from loading.
pub async fn discover(api: &ApiClient, retry: &RetryConfig) -> Discovery {
    let (names, jobs) = tokio::join!(
        api.label_values_with_retry(METRIC_NAME_LABEL, retry),
        api.label_values_with_retry(JOB_LABEL, retry),
    );

    let mut discovery = Discovery::default();
    match names {
        Ok(names) => discovery.metric_names = names,
        Err(error) => {
            warn!("metric name discovery failed: {error}");
            discovery.errors.push(DiscoveryError {
                label: METRIC_NAME_LABEL,
                error,
            });
        }
    }
    match jobs {
        Ok(jobs) => discovery.jobs = jobs,
        Err(error) => {
            warn!("job discovery failed: {error}");
            discovery.errors.push(DiscoveryError {
                label: JOB_LABEL,
                error,
            });
        }
    }
    discovery
}

/// Fetch and parse the current series for `selection`. An inactive
/// selection yields an empty map without a request.
pub async fn fetch_series<S: MetricsSource>(
    source: &S,
    selection: &Selection,
) -> Result<SeriesMap, ClientError> {
    let Some(selector) = selector_for(selection) else {
        return Ok(SeriesMap::new());
    };
    fetch_selector(source, &selector).await
}

pub(crate) async fn fetch_selector<S: MetricsSource>(
    source: &S,
    selector: &str,
) -> Result<SeriesMap, ClientError> {
    let body = source.fetch_export(selector).await?;
    Ok(parse_logged(&body))
}

/// Parse an export body, logging every line that had to be dropped or trimmed.
pub fn parse_logged(body: &str) -> SeriesMap {
    let parsed = parse_export(body);
    for err in &parsed.skipped {
        warn!("skipping export line: {err}");
    }
    for line in &parsed.truncated {
        warn!(line, "timestamps and values differ in length, truncated");
    }
    parsed.series
}
