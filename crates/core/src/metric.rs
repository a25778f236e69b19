use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Instance label used when a series carries neither `instance` nor `job`.
pub const UNKNOWN_INSTANCE: &str = "unknown";

/// Composite `<metric>_<instance>` key of a series.
///
/// The key is derived only from the metric name and instance label, so a
/// series polled twice lands on the same entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesKey(String);

impl SeriesKey {
    pub fn new(metric_name: &str, instance: &str) -> Self {
        Self(format!("{metric_name}_{instance}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SeriesKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One named, time-ordered sequence of samples for a metric + instance.
///
/// `timestamps` (milliseconds since epoch) and `values` always have the same
/// length; the constructor truncates to the shorter side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub metric_name: String,
    pub instance: String,
    timestamps: Vec<i64>,
    values: Vec<f64>,
}

impl MetricSeries {
    pub fn new(
        metric_name: impl Into<String>,
        instance: impl Into<String>,
        mut timestamps: Vec<i64>,
        mut values: Vec<f64>,
    ) -> Self {
        let len = timestamps.len().min(values.len());
        timestamps.truncate(len);
        values.truncate(len);
        Self {
            metric_name: metric_name.into(),
            instance: instance.into(),
            timestamps,
            values,
        }
    }

    pub fn key(&self) -> SeriesKey {
        SeriesKey::new(&self.metric_name, &self.instance)
    }

    /// Legend label, e.g. `up (node-1:9100)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.metric_name, self.instance)
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// `(timestamp_ms, value)` pairs in wire order.
    pub fn samples(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    pub fn latest(&self) -> Option<(i64, f64)> {
        self.samples().last()
    }
}

/// Full result of one poll. Replaced wholesale on every tick.
pub type SeriesMap = BTreeMap<SeriesKey, MetricSeries>;
