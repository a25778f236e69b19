use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Visible window of the metrics charts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "6h")]
    Hours6,
    #[serde(rename = "24h")]
    Hours24,
    #[serde(rename = "7d")]
    Days7,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [Self::Hour1, Self::Hours6, Self::Hours24, Self::Days7];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour1 => "1h",
            Self::Hours6 => "6h",
            Self::Hours24 => "24h",
            Self::Days7 => "7d",
        }
    }

    pub fn duration(&self) -> Duration {
        let hours = match self {
            Self::Hour1 => 1,
            Self::Hours6 => 6,
            Self::Hours24 => 24,
            Self::Days7 => 24 * 7,
        };
        Duration::from_secs(hours * 3600)
    }

    pub fn cycle(&self) -> Self {
        match self {
            Self::Hour1 => Self::Hours6,
            Self::Hours6 => Self::Hours24,
            Self::Hours24 => Self::Days7,
            Self::Days7 => Self::Hour1,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time range `{0}` (expected 1h, 6h, 24h or 7d)")]
pub struct ParseTimeRangeError(String);

impl FromStr for TimeRange {
    type Err = ParseTimeRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseTimeRangeError(s.to_string()))
    }
}

/// What the metrics view is currently asking for.
///
/// Metric names keep the order they were selected in and never repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    job: Option<String>,
    metrics: Vec<String>,
    pub time_range: TimeRange,
}

impl Selection {
    pub fn new(metrics: impl IntoIterator<Item = String>, job: Option<String>) -> Self {
        let mut selection = Self::default();
        for metric in metrics {
            selection.select_metric(metric);
        }
        selection.set_job(job);
        selection
    }

    pub fn job(&self) -> Option<&str> {
        self.job.as_deref()
    }

    /// An empty job name means "all jobs".
    pub fn set_job(&mut self, job: Option<String>) {
        self.job = job.filter(|j| !j.trim().is_empty());
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn is_selected(&self, metric: &str) -> bool {
        self.metrics.iter().any(|m| m == metric)
    }

    pub fn select_metric(&mut self, metric: String) {
        if !self.is_selected(&metric) {
            self.metrics.push(metric);
        }
    }

    /// Add the metric if absent, remove it otherwise. Returns the new state.
    pub fn toggle_metric(&mut self, metric: &str) -> bool {
        if let Some(pos) = self.metrics.iter().position(|m| m == metric) {
            self.metrics.remove(pos);
            false
        } else {
            self.metrics.push(metric.to_string());
            true
        }
    }

    pub fn clear_metrics(&mut self) {
        self.metrics.clear();
    }

    /// Polling only runs while at least one metric is selected.
    pub fn is_active(&self) -> bool {
        !self.metrics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_range_parses_and_cycles() {
        assert_eq!("24h".parse::<TimeRange>().unwrap(), TimeRange::Hours24);
        assert_eq!(" 7D ".parse::<TimeRange>().unwrap(), TimeRange::Days7);
        assert!("2w".parse::<TimeRange>().is_err());
        assert_eq!(TimeRange::Days7.cycle(), TimeRange::Hour1);
        assert_eq!(TimeRange::Hours6.duration(), Duration::from_secs(6 * 3600));
    }

    #[test]
    fn time_range_serde_uses_short_names() {
        let json = serde_json::to_string(&TimeRange::Hours6).unwrap();
        assert_eq!(json, "\"6h\"");
        let parsed: TimeRange = serde_json::from_str("\"1h\"").unwrap();
        assert_eq!(parsed, TimeRange::Hour1);
    }

    #[test]
    fn toggle_preserves_order_and_uniqueness() {
        let mut sel = Selection::default();
        assert!(sel.toggle_metric("up"));
        assert!(sel.toggle_metric("node_load1"));
        sel.select_metric("up".to_string());
        assert_eq!(sel.metrics(), &["up".to_string(), "node_load1".to_string()]);

        assert!(!sel.toggle_metric("up"));
        assert_eq!(sel.metrics(), &["node_load1".to_string()]);
        assert!(sel.is_active());

        sel.clear_metrics();
        assert!(!sel.is_active());
    }

    #[test]
    fn blank_job_means_all_jobs() {
        let sel = Selection::new(vec!["up".to_string()], Some("  ".to_string()));
        assert_eq!(sel.job(), None);

        let sel = Selection::new(vec![], Some("node".to_string()));
        assert_eq!(sel.job(), Some("node"));
    }
}
